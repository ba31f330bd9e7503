use surrealdb::types::SurrealValue;

use super::{Backend, KeywordQuery, StoreError};
use crate::{db::DbHandle, models::FileRecord};

const SELECT_ALL: &str = "SELECT name, path, size, modified_time FROM file ORDER BY path ASC";

const SELECT_MATCHING: &str = "SELECT name, path, size, modified_time FROM file
    WHERE string::contains(string::lowercase(name), $needle)
       OR string::contains(string::lowercase(path), $needle)
    ORDER BY path ASC";

#[derive(Debug, Clone, SurrealValue)]
struct FileRow {
	name: String,
	path: String,
	size: i64,
	modified_time: String,
}

impl TryFrom<FileRow> for FileRecord {
	type Error = StoreError;

	fn try_from(row: FileRow) -> Result<Self, Self::Error> {
		let size = u64::try_from(row.size)
			.map_err(|_| StoreError::Query(format!("negative size {} stored for {}", row.size, row.path)))?;
		Ok(FileRecord {
			name: row.name,
			path: row.path,
			size,
			modified_time: row.modified_time,
		})
	}
}

#[derive(Debug, Clone, SurrealValue)]
struct CountRow {
	count: i64,
}

/// Durable backend on the `file` table. `path` carries a UNIQUE index.
#[derive(Clone)]
pub struct SurrealBackend {
	db: DbHandle,
}

impl SurrealBackend {
	pub fn new(db: DbHandle) -> Self {
		Self { db }
	}
}

impl Backend for SurrealBackend {
	async fn find_one(&self, path: &str) -> Result<Option<FileRecord>, StoreError> {
		let mut response = self
			.db
			.db
			.query("SELECT name, path, size, modified_time FROM file WHERE path = $path LIMIT 1")
			.bind(("path", path.to_string()))
			.await
			.map_err(|e| StoreError::Query(e.to_string()))?;

		let rows: Vec<FileRow> = response.take(0).map_err(|e| StoreError::Query(e.to_string()))?;
		rows.into_iter().next().map(FileRecord::try_from).transpose()
	}

	async fn insert(&self, record: &FileRecord) -> Result<(), StoreError> {
		let persistence = |e: surrealdb::Error| StoreError::Persistence {
			path: record.path.clone(),
			reason: e.to_string(),
		};
		let size = i64::try_from(record.size).map_err(|_| StoreError::Persistence {
			path: record.path.clone(),
			reason: format!("size {} does not fit the size field", record.size),
		})?;

		self.db
			.db
			.query(
				"CREATE file CONTENT {
                    name: $name,
                    path: $path,
                    size: $size,
                    modified_time: $modified_time,
                }",
			)
			.bind(("name", record.name.clone()))
			.bind(("path", record.path.clone()))
			.bind(("size", size))
			.bind(("modified_time", record.modified_time.clone()))
			.await
			.map_err(persistence)?
			.check()
			.map_err(persistence)?;

		Ok(())
	}

	async fn find_matching(&self, query: &KeywordQuery) -> Result<Vec<FileRecord>, StoreError> {
		let mut response = if query.is_empty() {
			self.db.db.query(SELECT_ALL).await
		} else {
			self.db
				.db
				.query(SELECT_MATCHING)
				.bind(("needle", query.needle().to_string()))
				.await
		}
		.map_err(|e| StoreError::Query(e.to_string()))?;
		let rows: Vec<FileRow> = response.take(0).map_err(|e| StoreError::Query(e.to_string()))?;

		rows.into_iter().map(FileRecord::try_from).collect()
	}

	async fn count(&self) -> Result<usize, StoreError> {
		let mut response = self
			.db
			.db
			.query("SELECT count() AS count FROM file GROUP ALL")
			.await
			.map_err(|e| StoreError::Query(e.to_string()))?;

		let rows: Vec<CountRow> = response.take(0).map_err(|e| StoreError::Query(e.to_string()))?;
		Ok(rows.first().map_or(0, |r| r.count.max(0) as usize))
	}
}
