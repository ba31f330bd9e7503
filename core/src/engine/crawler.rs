use std::{fs, io, path::Path};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::{config::CrawlConfig, models::FileRecord};

#[derive(Debug, Error)]
pub enum CrawlError {
	#[error("root path does not exist: {0}")]
	RootNotFound(String),

	#[error("root path is not a directory: {0}")]
	RootNotDir(String),

	#[error("cannot read root directory {path}: {source}")]
	RootUnreadable {
		path: String,
		#[source]
		source: io::Error,
	},

	#[error("failed to read metadata for {path}: {source}")]
	Metadata {
		path: String,
		#[source]
		source: io::Error,
	},

	#[error("filesystem walk error: {0}")]
	Walk(#[from] walkdir::Error),
}

impl CrawlError {
	/// Whether the whole crawl failed, as opposed to a single entry.
	pub fn is_fatal(&self) -> bool {
		matches!(
			self,
			CrawlError::RootNotFound(_) | CrawlError::RootNotDir(_) | CrawlError::RootUnreadable { .. }
		)
	}
}

/// Everything a finished crawl produced.
#[derive(Debug, Default)]
pub struct CrawlOutput {
	pub records: Vec<FileRecord>,
	pub failures: Vec<CrawlError>,
	pub excluded: u64,
}

/// Walks a tree and turns every accepted file into a [`FileRecord`].
#[derive(Debug, Clone, Default)]
pub struct Crawler {
	config: CrawlConfig,
}

impl Crawler {
	pub fn new(config: CrawlConfig) -> Self {
		Self { config }
	}

	/// Hidden base names and any path containing an exclude pattern are rejected.
	pub fn is_excluded(&self, name: &str, path: &str) -> bool {
		name.starts_with('.') || self.config.exclude_patterns.iter().any(|p| path.contains(p.as_str()))
	}

	/// Fails only if `root` itself is unusable.
	pub fn check_root(root: &Path) -> Result<(), CrawlError> {
		if !root.exists() {
			return Err(CrawlError::RootNotFound(root.display().to_string()));
		}
		if !root.is_dir() {
			return Err(CrawlError::RootNotDir(root.display().to_string()));
		}
		fs::read_dir(root).map_err(|source| CrawlError::RootUnreadable {
			path: root.display().to_string(),
			source,
		})?;
		Ok(())
	}

	/// Lazily walk `root`, yielding one item per candidate file.
	///
	/// Per-entry failures come out as `Err` items and the walk carries on.
	pub fn walk(&self, root: &Path) -> Result<Crawl<'_>, CrawlError> {
		Self::check_root(root)?;

		let mut walker = WalkDir::new(root)
			.follow_links(self.config.follow_links)
			.sort_by_file_name();
		if let Some(depth) = self.config.max_depth {
			walker = walker.max_depth(depth);
		}

		Ok(Crawl {
			crawler: self,
			inner: walker.into_iter(),
			excluded: 0,
		})
	}

	/// Walk `root` to completion and collect the results.
	pub fn crawl(&self, root: &Path) -> Result<CrawlOutput, CrawlError> {
		let mut crawl = self.walk(root)?;
		let mut output = CrawlOutput::default();

		for item in crawl.by_ref() {
			match item {
				Ok(record) => output.records.push(record),
				Err(e) => output.failures.push(e),
			}
		}
		output.excluded = crawl.excluded();

		Ok(output)
	}
}

/// In-progress walk. See [`Crawler::walk`].
pub struct Crawl<'a> {
	crawler: &'a Crawler,
	inner: walkdir::IntoIter,
	excluded: u64,
}

impl Crawl<'_> {
	/// Files rejected by the exclusion policy so far.
	pub fn excluded(&self) -> u64 {
		self.excluded
	}
}

impl Iterator for Crawl<'_> {
	type Item = Result<FileRecord, CrawlError>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let entry = match self.inner.next()? {
				Ok(e) => e,
				Err(e) => return Some(Err(CrawlError::Walk(e))),
			};

			if entry.file_type().is_dir() {
				continue;
			}

			let name = entry.file_name().to_string_lossy().into_owned();
			let path = entry.path().to_string_lossy().into_owned();

			if self.crawler.is_excluded(&name, &path) {
				self.excluded += 1;
				debug!("Skipped: {path} (excluded by pattern)");
				continue;
			}

			// Follows file symlinks; a dangling link fails here.
			let metadata = match fs::metadata(entry.path()) {
				Ok(m) => m,
				Err(source) => return Some(Err(CrawlError::Metadata { path, source })),
			};

			// Symlinked directories when not following links, fifos, sockets.
			if !metadata.is_file() {
				continue;
			}

			return Some(
				FileRecord::from_metadata(name, path.clone(), &metadata)
					.map_err(|source| CrawlError::Metadata { path, source }),
			);
		}
	}
}
