//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Query resolution (`ListingResolver`)
//! - Listing detail extraction (`DetailExtractor`)

mod details;
mod resolver;

pub use details::DetailExtractor;
pub use resolver::{ListingResolver, Resolution};
