pub mod file_record;

pub use file_record::{format_modified, FileRecord};
