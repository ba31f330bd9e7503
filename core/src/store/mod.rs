//! Deduplicating record store and keyword search.
//!
//! [`IndexStore`] owns the insert-if-absent policy; a [`Backend`] only has to
//! answer three questions: is this path known, store this record, and which
//! records match this query.

pub mod memory;
pub mod surreal;

use std::future::Future;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::models::FileRecord;

pub use memory::MemoryBackend;
pub use surreal::SurrealBackend;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("failed to index {path}: {reason}")]
	Persistence { path: String, reason: String },

	#[error("query error: {0}")]
	Query(String),

	#[error("database connection error: {0}")]
	Connect(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
	Inserted,
	/// A record with the same path already exists. Nothing was written.
	Skipped,
}

/// Case-insensitive literal substring match against name or path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordQuery {
	needle: String,
}

impl KeywordQuery {
	pub fn new(keyword: &str) -> Self {
		Self {
			needle: keyword.to_lowercase(),
		}
	}

	/// The case-folded keyword.
	pub fn needle(&self) -> &str {
		&self.needle
	}

	/// An empty keyword matches every record.
	pub fn is_empty(&self) -> bool {
		self.needle.is_empty()
	}

	pub fn matches(&self, record: &FileRecord) -> bool {
		self.is_empty()
			|| record.name.to_lowercase().contains(&self.needle)
			|| record.path.to_lowercase().contains(&self.needle)
	}
}

/// Storage primitives the index is built on.
pub trait Backend: Send + Sync {
	fn find_one(&self, path: &str) -> impl Future<Output = Result<Option<FileRecord>, StoreError>> + Send;

	/// Failures must come back as [`StoreError::Persistence`] naming the path.
	fn insert(&self, record: &FileRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

	/// Matches in a stable order for an unchanged store.
	fn find_matching(&self, query: &KeywordQuery) -> impl Future<Output = Result<Vec<FileRecord>, StoreError>> + Send;

	fn count(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// The index: at most one record per path, first write wins.
pub struct IndexStore<B> {
	backend: B,
	write_lock: Mutex<()>,
}

impl<B: Backend> IndexStore<B> {
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			write_lock: Mutex::new(()),
		}
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Insert `record` unless its path is already indexed.
	pub async fn upsert(&self, record: FileRecord) -> Result<UpsertOutcome, StoreError> {
		// Check and insert must not interleave with another upsert.
		let _guard = self.write_lock.lock().await;

		let existing = self
			.backend
			.find_one(&record.path)
			.await
			.map_err(|e| blame(&record.path, e))?;
		if existing.is_some() {
			return Ok(UpsertOutcome::Skipped);
		}

		self.backend.insert(&record).await.map_err(|e| blame(&record.path, e))?;

		info!("Indexed: {}", record.path);
		Ok(UpsertOutcome::Inserted)
	}

	pub async fn search(&self, keyword: &str) -> Result<Vec<FileRecord>, StoreError> {
		self.backend.find_matching(&KeywordQuery::new(keyword)).await
	}

	pub async fn len(&self) -> Result<usize, StoreError> {
		self.backend.count().await
	}

	pub async fn is_empty(&self) -> Result<bool, StoreError> {
		Ok(self.len().await? == 0)
	}
}

/// Per-record failures always name the record's path.
fn blame(path: &str, e: StoreError) -> StoreError {
	match e {
		StoreError::Persistence { .. } => e,
		other => StoreError::Persistence {
			path: path.to_string(),
			reason: other.to_string(),
		},
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	fn record(name: &str, path: &str) -> FileRecord {
		FileRecord {
			name: name.into(),
			path: path.into(),
			size: 10,
			modified_time: "2024-01-01 00:00:00".into(),
		}
	}

	#[test]
	fn keyword_matches_substring_of_name() {
		let query = KeywordQuery::new("port");
		assert!(query.matches(&record("report.txt", "/docs/report.txt")));
		assert!(!KeywordQuery::new("xyz").matches(&record("abc.txt", "/docs/abc.txt")));
	}

	#[test]
	fn keyword_matches_path_only() {
		let query = KeywordQuery::new("docs");
		assert!(query.matches(&record("abc.txt", "/home/DOCS/abc.txt")));
	}

	#[test]
	fn keyword_ignores_case() {
		let file = record("README.md", "/repo/README.md");
		assert!(KeywordQuery::new("readme").matches(&file));
		assert!(KeywordQuery::new("ReadMe").matches(&file));
	}

	#[test]
	fn keyword_is_literal() {
		let query = KeywordQuery::new("a.c");
		assert!(query.matches(&record("a.c", "/src/a.c")));
		assert!(!query.matches(&record("abc", "/src/abc")));
		assert!(!KeywordQuery::new(".*").matches(&record("abc", "/src/abc")));
	}

	#[test]
	fn empty_keyword_matches_everything() {
		let query = KeywordQuery::new("");
		assert!(query.is_empty());
		assert!(query.matches(&record("abc", "/src/abc")));
	}

	#[tokio::test]
	async fn upsert_is_first_write_wins() {
		let store = IndexStore::new(MemoryBackend::new());

		let first = record("a.txt", "/x/a.txt");
		let mut second = first.clone();
		second.size = 999;

		assert_eq!(store.upsert(first.clone()).await.unwrap(), UpsertOutcome::Inserted);
		assert_eq!(store.upsert(second).await.unwrap(), UpsertOutcome::Skipped);

		let all = store.search("").await.unwrap();
		assert_eq!(all, vec![first]);
	}

	#[tokio::test]
	async fn search_is_case_insensitive() {
		let store = IndexStore::new(MemoryBackend::new());
		store.upsert(record("README.md", "/repo/README.md")).await.unwrap();
		store.upsert(record("main.rs", "/repo/src/main.rs")).await.unwrap();

		let lower = store.search("readme").await.unwrap();
		let upper = store.search("README").await.unwrap();

		assert_eq!(lower, upper);
		assert_eq!(lower.len(), 1);
	}

	#[tokio::test]
	async fn concurrent_upserts_keep_paths_unique() {
		let store = Arc::new(IndexStore::new(MemoryBackend::new()));

		let mut handles = Vec::new();
		for i in 0..32 {
			let store = store.clone();
			handles.push(tokio::spawn(async move {
				let path = format!("/x/file{}.txt", i % 4);
				store.upsert(record("file.txt", &path)).await.unwrap()
			}));
		}

		let mut inserted = 0;
		for handle in handles {
			if handle.await.unwrap() == UpsertOutcome::Inserted {
				inserted += 1;
			}
		}

		assert_eq!(inserted, 4);
		assert_eq!(store.len().await.unwrap(), 4);
	}

	struct BrokenBackend;

	impl Backend for BrokenBackend {
		async fn find_one(&self, _path: &str) -> Result<Option<FileRecord>, StoreError> {
			Ok(None)
		}

		async fn insert(&self, _record: &FileRecord) -> Result<(), StoreError> {
			Err(StoreError::Connect("store unavailable".into()))
		}

		async fn find_matching(&self, _query: &KeywordQuery) -> Result<Vec<FileRecord>, StoreError> {
			Ok(Vec::new())
		}

		async fn count(&self) -> Result<usize, StoreError> {
			Ok(0)
		}
	}

	#[tokio::test]
	async fn insert_failure_names_the_path() {
		let store = IndexStore::new(BrokenBackend);

		let err = store.upsert(record("a.txt", "/x/a.txt")).await.unwrap_err();

		match err {
			StoreError::Persistence { path, reason } => {
				assert_eq!(path, "/x/a.txt");
				assert!(reason.contains("store unavailable"));
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	struct LookupDownBackend;

	impl Backend for LookupDownBackend {
		async fn find_one(&self, _path: &str) -> Result<Option<FileRecord>, StoreError> {
			Err(StoreError::Query("connection lost".into()))
		}

		async fn insert(&self, _record: &FileRecord) -> Result<(), StoreError> {
			Ok(())
		}

		async fn find_matching(&self, _query: &KeywordQuery) -> Result<Vec<FileRecord>, StoreError> {
			Ok(Vec::new())
		}

		async fn count(&self) -> Result<usize, StoreError> {
			Ok(0)
		}
	}

	#[tokio::test]
	async fn lookup_failure_names_the_path() {
		let store = IndexStore::new(LookupDownBackend);

		let err = store.upsert(record("a.txt", "/x/a.txt")).await.unwrap_err();

		assert!(err.to_string().contains("/x/a.txt"));
		match err {
			StoreError::Persistence { path, reason } => {
				assert_eq!(path, "/x/a.txt");
				assert!(reason.contains("connection lost"));
			}
			other => panic!("unexpected error: {other}"),
		}
	}
}
