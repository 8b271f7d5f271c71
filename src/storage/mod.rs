//! Storage abstractions for place persistence.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Place;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for place output backends.
#[async_trait]
pub trait PlaceStorage: Send + Sync {
    /// Replace any previous output with `places`.
    ///
    /// Returns a human-readable location of the written data.
    async fn write_places(&self, places: &[Place]) -> Result<String>;
}
