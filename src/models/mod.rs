// src/models/mod.rs

//! Domain models for the crawler application.

mod config;
mod place;

// Re-export all public types
pub use config::{BrowserConfig, Config, CrawlerConfig, OutputConfig, SelectorConfig, SiteConfig};
pub use place::Place;
