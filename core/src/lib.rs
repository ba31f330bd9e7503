//! Metadata indexing and keyword search over a directory tree.
//!
//! [`Crawler`] walks a tree and yields one [`FileRecord`] per accepted file;
//! [`IndexStore`] keeps the first record seen for each path and answers
//! case-insensitive substring queries against either backend.

pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod store;

pub use config::{BackendKind, Config, ConfigError, CrawlConfig, StoreConfig};
pub use engine::{index_directory, CrawlError, Crawler, IndexSummary};
pub use models::FileRecord;
pub use store::{Backend, IndexStore, KeywordQuery, MemoryBackend, StoreError, SurrealBackend, UpsertOutcome};
