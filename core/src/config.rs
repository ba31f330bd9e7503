//! On-disk configuration for crawling and storage.
//!
//! Every field has a default, so an empty or missing file is a valid config.

use std::{
	fs,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Substrings that disqualify a path when found anywhere in it.
pub const DEFAULT_EXCLUDE_PATTERNS: [&str; 4] = [".cph", ".tmp", ".log", ".prob"];

const APP_DIR: &str = "filedex";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
	pub crawl: CrawlConfig,
	pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CrawlConfig {
	pub exclude_patterns: Vec<String>,
	/// Descend into symlinked directories. Loops are reported, not followed.
	pub follow_links: bool,
	pub max_depth: Option<usize>,
}

impl Default for CrawlConfig {
	fn default() -> Self {
		Self {
			exclude_patterns: DEFAULT_EXCLUDE_PATTERNS.iter().map(|p| p.to_string()).collect(),
			follow_links: false,
			max_depth: None,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
	/// Process-local, gone at exit.
	Memory,
	/// SurrealKV file on disk.
	#[default]
	Persistent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
	pub backend: BackendKind,
	pub path: Option<PathBuf>,
	pub namespace: String,
	pub database: String,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			backend: BackendKind::default(),
			path: None,
			namespace: APP_DIR.to_string(),
			database: APP_DIR.to_string(),
		}
	}
}

impl StoreConfig {
	/// Explicit path, else `<data dir>/filedex/index.db`, else `./filedex.db`.
	pub fn resolved_path(&self) -> PathBuf {
		if let Some(path) = &self.path {
			return path.clone();
		}
		match dirs::data_dir() {
			Some(dir) => dir.join(APP_DIR).join("index.db"),
			None => PathBuf::from("filedex.db"),
		}
	}
}

impl Config {
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		Self::parse(&raw, path)
	}

	/// Load `path` if given, otherwise the user config file if one exists.
	pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
		if let Some(path) = path {
			return Self::load(path);
		}
		match default_config_path() {
			Some(path) if path.is_file() => Self::load(&path),
			_ => Ok(Self::default()),
		}
	}

	fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
		toml::from_str(raw).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}
}

/// `<config dir>/filedex/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}
