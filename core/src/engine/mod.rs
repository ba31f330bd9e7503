pub mod crawler;
pub mod indexer;

pub use crawler::{Crawl, CrawlError, CrawlOutput, Crawler};
pub use indexer::{index_directory, IndexSummary};
