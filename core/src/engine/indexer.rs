use std::path::Path;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::{
	engine::crawler::{CrawlError, Crawler},
	models::FileRecord,
	store::{Backend, IndexStore, UpsertOutcome},
};

/// Records in flight between the walker thread and the store.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
	pub indexed: u64,
	/// Already present in the store.
	pub skipped: u64,
	/// Rejected by the exclusion policy.
	pub excluded: u64,
	pub failed: u64,
}

/// Crawl `root` and upsert every record into `store`, one at a time.
///
/// Only an unusable root is an error. Everything after that is counted and
/// logged.
pub async fn index_directory<B: Backend>(
	crawler: &Crawler,
	store: &IndexStore<B>,
	root: &Path,
) -> Result<IndexSummary, CrawlError> {
	Crawler::check_root(root)?;

	// Walking blocks, so it runs on the blocking pool.
	let (tx, mut rx) = mpsc::channel(CHANNEL_CAPACITY);
	let walker = tokio::task::spawn_blocking({
		let crawler = crawler.clone();
		let root = root.to_path_buf();
		move || stream_crawl(&crawler, &root, tx)
	});

	let mut summary = IndexSummary::default();
	while let Some(item) = rx.recv().await {
		match item {
			Ok(record) => match store.upsert(record).await {
				Ok(UpsertOutcome::Inserted) => summary.indexed += 1,
				Ok(UpsertOutcome::Skipped) => summary.skipped += 1,
				Err(e) => {
					error!("{e}");
					summary.failed += 1;
				}
			},
			Err(e) => {
				report_crawl_failure(&e);
				summary.failed += 1;
			}
		}
	}

	match walker.await {
		Ok(Ok(excluded)) => summary.excluded = excluded,
		Ok(Err(e)) => return Err(e),
		Err(e) => error!("crawl task failed: {e}"),
	}

	info!(
		"indexed {} files ({} already indexed, {} excluded, {} failed)",
		summary.indexed, summary.skipped, summary.excluded, summary.failed
	);
	Ok(summary)
}

/// Runs on the blocking pool. Returns the excluded count.
fn stream_crawl(
	crawler: &Crawler,
	root: &Path,
	tx: mpsc::Sender<Result<FileRecord, CrawlError>>,
) -> Result<u64, CrawlError> {
	let mut crawl = crawler.walk(root)?;
	for item in crawl.by_ref() {
		// Receiver gone means the indexing future was dropped.
		if tx.blocking_send(item).is_err() {
			break;
		}
	}
	Ok(crawl.excluded())
}

fn report_crawl_failure(e: &CrawlError) {
	match e {
		CrawlError::Metadata { path, source } => warn!("Failed to index {path}: {source}"),
		CrawlError::Walk(walk) => match walk.path() {
			Some(path) => warn!("Failed to index {}: {walk}", path.display()),
			None => warn!("{walk}"),
		},
		other => warn!("{other}"),
	}
}

#[cfg(test)]
mod tests {
	use std::{collections::HashSet, fs};

	use super::*;
	use crate::store::{KeywordQuery, MemoryBackend, StoreError};

	fn tempdir() -> tempfile::TempDir {
		tempfile::Builder::new().prefix("filedex-index").tempdir().unwrap()
	}

	fn setup_tree(dir: &Path) {
		fs::create_dir_all(dir.join("sub")).unwrap();
		fs::write(dir.join("notes.txt"), vec![b'n'; 500]).unwrap();
		fs::write(dir.join(".hidden"), vec![b'h'; 10]).unwrap();
		fs::write(dir.join("cache.tmp"), vec![b't'; 20]).unwrap();
		fs::write(dir.join("sub/data.csv"), vec![b'd'; 300]).unwrap();
	}

	#[tokio::test]
	async fn indexes_accepted_files() {
		let tmp = tempdir();
		setup_tree(tmp.path());
		let store = IndexStore::new(MemoryBackend::new());

		let summary = index_directory(&Crawler::default(), &store, tmp.path()).await.unwrap();

		assert_eq!(
			summary,
			IndexSummary {
				indexed: 2,
				skipped: 0,
				excluded: 2,
				failed: 0,
			}
		);
		assert_eq!(store.len().await.unwrap(), 2);
	}

	#[tokio::test]
	async fn reindexing_is_idempotent() {
		let tmp = tempdir();
		setup_tree(tmp.path());
		let store = IndexStore::new(MemoryBackend::new());
		let crawler = Crawler::default();

		index_directory(&crawler, &store, tmp.path()).await.unwrap();
		let first = store.search("").await.unwrap();

		let again = index_directory(&crawler, &store, tmp.path()).await.unwrap();
		let second = store.search("").await.unwrap();

		assert_eq!(again.indexed, 0);
		assert_eq!(again.skipped, 2);
		assert_eq!(first, second);

		let paths: HashSet<&str> = second.iter().map(|r| r.path.as_str()).collect();
		assert_eq!(paths.len(), second.len());
	}

	#[tokio::test]
	async fn metadata_failure_is_isolated() {
		let tmp = tempdir();
		setup_tree(tmp.path());
		std::os::unix::fs::symlink(tmp.path().join("missing"), tmp.path().join("dangling.txt")).unwrap();
		let store = IndexStore::new(MemoryBackend::new());

		let summary = index_directory(&Crawler::default(), &store, tmp.path()).await.unwrap();

		assert_eq!(summary.indexed, 2);
		assert_eq!(summary.failed, 1);
	}

	/// Refuses to store one specific path.
	struct RejectingBackend {
		inner: MemoryBackend,
		reject: String,
	}

	impl Backend for RejectingBackend {
		async fn find_one(&self, path: &str) -> Result<Option<FileRecord>, StoreError> {
			self.inner.find_one(path).await
		}

		async fn insert(&self, record: &FileRecord) -> Result<(), StoreError> {
			if record.path.ends_with(&self.reject) {
				return Err(StoreError::Persistence {
					path: record.path.clone(),
					reason: "write rejected".into(),
				});
			}
			self.inner.insert(record).await
		}

		async fn find_matching(&self, query: &KeywordQuery) -> Result<Vec<FileRecord>, StoreError> {
			self.inner.find_matching(query).await
		}

		async fn count(&self) -> Result<usize, StoreError> {
			self.inner.count().await
		}
	}

	#[tokio::test]
	async fn persistence_failure_is_isolated() {
		let tmp = tempdir();
		setup_tree(tmp.path());
		let store = IndexStore::new(RejectingBackend {
			inner: MemoryBackend::new(),
			reject: "notes.txt".into(),
		});

		let summary = index_directory(&Crawler::default(), &store, tmp.path()).await.unwrap();

		assert_eq!(summary.indexed, 1);
		assert_eq!(summary.failed, 1);
		let names: Vec<String> = store.search("").await.unwrap().into_iter().map(|r| r.name).collect();
		assert_eq!(names, vec!["data.csv"]);
	}

	#[tokio::test]
	async fn bad_root_is_an_error() {
		let store = IndexStore::new(MemoryBackend::new());

		let err = index_directory(&Crawler::default(), &store, Path::new("/tmp/filedex_definitely_not_real"))
			.await
			.unwrap_err();

		assert!(matches!(err, CrawlError::RootNotFound(_)));
		assert!(store.is_empty().await.unwrap());
	}

	#[tokio::test]
	async fn empty_dir_indexes_nothing() {
		let tmp = tempdir();
		let store = IndexStore::new(MemoryBackend::new());

		let summary = index_directory(&Crawler::default(), &store, tmp.path()).await.unwrap();

		assert_eq!(summary, IndexSummary::default());
	}

	#[tokio::test]
	async fn unreadable_root_is_an_error() {
		use std::os::unix::fs::PermissionsExt;

		let tmp = tempdir();
		let locked = tmp.path().join("locked");
		fs::create_dir_all(&locked).unwrap();
		fs::write(locked.join("notes.txt"), "x").unwrap();
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

		// Permission bits do not apply to root.
		let readable = fs::read_dir(&locked).is_ok();
		let store = IndexStore::new(MemoryBackend::new());
		let result = index_directory(&Crawler::default(), &store, &locked).await;
		fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
		if readable {
			return;
		}

		assert!(matches!(result.unwrap_err(), CrawlError::RootUnreadable { .. }));
		assert!(store.is_empty().await.unwrap());
	}
}
