mod prompt;
mod table;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::Term;
use filedex_core::{
	db, index_directory, Backend, BackendKind, Config, Crawler, IndexStore, MemoryBackend, SurrealBackend,
};
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Index file metadata under a directory and search it by keyword.
#[derive(Parser)]
#[command(name = "filedex")]
#[command(version)]
struct Args {
	/// Directory to crawl. Prompted for when omitted.
	root: Option<PathBuf>,

	/// Keyword to search names and paths for. Prompted for when omitted.
	#[arg(short, long)]
	keyword: Option<String>,

	/// Configuration file path
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Where records are kept
	#[arg(long, value_enum)]
	backend: Option<BackendArg>,

	/// Index file for the persistent backend
	#[arg(long)]
	db_path: Option<PathBuf>,

	/// Path substring to exclude. Repeat to build the list; replaces the configured one.
	#[arg(long = "exclude", value_name = "PATTERN")]
	exclude: Vec<String>,

	/// Descend into symlinked directories
	#[arg(long)]
	follow_links: bool,

	#[arg(long)]
	max_depth: Option<usize>,

	/// Search the existing index without crawling
	#[arg(long, conflicts_with = "root")]
	no_index: bool,

	/// Debug logging (RUST_LOG overrides)
	#[arg(short, long)]
	verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
	Memory,
	Persistent,
}

impl From<BackendArg> for BackendKind {
	fn from(arg: BackendArg) -> Self {
		match arg {
			BackendArg::Memory => BackendKind::Memory,
			BackendArg::Persistent => BackendKind::Persistent,
		}
	}
}

impl Args {
	/// Flags win over whatever the config file says.
	fn apply(&self, config: &mut Config) {
		if let Some(backend) = self.backend {
			config.store.backend = backend.into();
		}
		if let Some(path) = &self.db_path {
			config.store.path = Some(path.clone());
		}
		if !self.exclude.is_empty() {
			config.crawl.exclude_patterns = self.exclude.clone();
		}
		if self.follow_links {
			config.crawl.follow_links = true;
		}
		if self.max_depth.is_some() {
			config.crawl.max_depth = self.max_depth;
		}
	}
}

fn setup_logging(verbose: bool) {
	let level = if verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
		.init();
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();
	setup_logging(args.verbose);

	match run(&args).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{e:#}");
			ExitCode::FAILURE
		}
	}
}

async fn run(args: &Args) -> Result<()> {
	let mut config = Config::load_or_default(args.config.as_deref())?;
	args.apply(&mut config);

	let crawler = Crawler::new(config.crawl.clone());

	match config.store.backend {
		BackendKind::Memory => {
			if args.no_index {
				warn!("--no-index with the memory backend always searches an empty index");
			}
			session(IndexStore::new(MemoryBackend::new()), &crawler, args).await
		}
		BackendKind::Persistent => {
			let handle = db::open(&config.store)
				.await
				.with_context(|| format!("failed to open index at {}", config.store.resolved_path().display()))?;
			session(IndexStore::new(SurrealBackend::new(handle)), &crawler, args).await
		}
	}
}

/// One crawl-then-search pass against `store`.
async fn session<B: Backend>(store: IndexStore<B>, crawler: &Crawler, args: &Args) -> Result<()> {
	let term = Term::stdout();

	if !args.no_index {
		let root = match &args.root {
			Some(root) => root.clone(),
			None => PathBuf::from(prompt::ask_directory(&term)?),
		};
		index_directory(crawler, &store, &root)
			.await
			.with_context(|| format!("cannot crawl {}", root.display()))?;
	}

	let keyword = match &args.keyword {
		Some(keyword) => keyword.clone(),
		None => prompt::ask_keyword(&term)?,
	};

	let results = store.search(&keyword).await?;
	term.write_str(&table::render(&results))?;

	Ok(())
}
