// src/lib.rs

//! Places Crawler Library
//!
//! Resolves free-text queries to business listings in a map search interface
//! and extracts their details and reviews through a browser automation
//! backend.

pub mod browser;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
