use std::collections::HashMap;

use parking_lot::RwLock;

use super::{Backend, KeywordQuery, StoreError};
use crate::models::FileRecord;

#[derive(Debug, Default)]
struct Inner {
	records: Vec<FileRecord>,
	by_path: HashMap<String, usize>,
}

/// Process-local backend. Nothing survives the process.
///
/// Search results come back in insertion order.
#[derive(Debug, Default)]
pub struct MemoryBackend {
	inner: RwLock<Inner>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Backend for MemoryBackend {
	async fn find_one(&self, path: &str) -> Result<Option<FileRecord>, StoreError> {
		let inner = self.inner.read();
		Ok(inner.by_path.get(path).map(|&slot| inner.records[slot].clone()))
	}

	async fn insert(&self, record: &FileRecord) -> Result<(), StoreError> {
		let mut inner = self.inner.write();
		if inner.by_path.contains_key(&record.path) {
			return Err(StoreError::Persistence {
				path: record.path.clone(),
				reason: "path already indexed".into(),
			});
		}
		let slot = inner.records.len();
		inner.by_path.insert(record.path.clone(), slot);
		inner.records.push(record.clone());
		Ok(())
	}

	async fn find_matching(&self, query: &KeywordQuery) -> Result<Vec<FileRecord>, StoreError> {
		let inner = self.inner.read();
		Ok(inner.records.iter().filter(|r| query.matches(r)).cloned().collect())
	}

	async fn count(&self) -> Result<usize, StoreError> {
		Ok(self.inner.read().records.len())
	}
}
