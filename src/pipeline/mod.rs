//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Resolve and extract every configured query, then write the aggregate
//! - `resolve_query`: Resolve one query to its listing URL

pub mod crawl;

pub use crawl::{CrawlOutcome, CrawlSummary, crawl_query, resolve_query, run_crawler};
