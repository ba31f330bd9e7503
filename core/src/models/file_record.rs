use std::{fs::Metadata, io, time::SystemTime};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Fixed-width local timestamp stored alongside every record.
pub const MODIFIED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One indexed file.
/// `path` is the identity key; a record is never updated once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
	pub name: String,
	pub path: String,
	pub size: u64,
	pub modified_time: String,
}

impl FileRecord {
	/// Snapshot size and mtime from already-read metadata.
	pub fn from_metadata(name: impl Into<String>, path: impl Into<String>, metadata: &Metadata) -> io::Result<Self> {
		let modified = metadata.modified()?;
		Ok(Self {
			name: name.into(),
			path: path.into(),
			size: metadata.len(),
			modified_time: format_modified(modified),
		})
	}
}

/// Render a modification time in local time, whole seconds only.
pub fn format_modified(time: SystemTime) -> String {
	DateTime::<Local>::from(time).format(MODIFIED_TIME_FORMAT).to_string()
}
