use std::fs;

use surrealdb::engine::local::{Db, Mem, SurrealKv};
use surrealdb::Surreal;
use tracing::debug;

use crate::{config::StoreConfig, store::StoreError};

/// Wrapper around the SurrealDB handle.
/// Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct DbHandle {
	pub db: Surreal<Db>,
}

/// Open (or create) the on-disk index described by `config`.
pub async fn open(config: &StoreConfig) -> Result<DbHandle, StoreError> {
	let path = config.resolved_path();
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent)
			.map_err(|e| StoreError::Connect(format!("cannot create {}: {e}", parent.display())))?;
	}

	debug!("opening index at {}", path.display());
	let db = Surreal::new::<SurrealKv>(path).await.map_err(connect_error)?;
	init(db, &config.namespace, &config.database).await
}

/// Non-durable SurrealDB instance with the same schema.
pub async fn open_in_memory(namespace: &str, database: &str) -> Result<DbHandle, StoreError> {
	let db = Surreal::new::<Mem>(()).await.map_err(connect_error)?;
	init(db, namespace, database).await
}

/// Select ns/db and run migrations.
async fn init(db: Surreal<Db>, namespace: &str, database: &str) -> Result<DbHandle, StoreError> {
	db.use_ns(namespace).use_db(database).await.map_err(connect_error)?;
	run_migrations(&db).await?;
	Ok(DbHandle { db })
}

/// DEFINE statements are idempotent.
async fn run_migrations(db: &Surreal<Db>) -> Result<(), StoreError> {
	db.query(SCHEMA_V1)
		.await
		.map_err(connect_error)?
		.check()
		.map_err(connect_error)?;
	Ok(())
}

fn connect_error(e: surrealdb::Error) -> StoreError {
	StoreError::Connect(e.to_string())
}

const SCHEMA_V1: &str = "
    DEFINE TABLE OVERWRITE file SCHEMAFULL;
    DEFINE FIELD OVERWRITE name ON file TYPE string;
    DEFINE FIELD OVERWRITE path ON file TYPE string;
    DEFINE FIELD OVERWRITE size ON file TYPE int;
    DEFINE FIELD OVERWRITE modified_time ON file TYPE string;
    DEFINE INDEX OVERWRITE idx_file_path ON file FIELDS path UNIQUE;
";
