//! Browser automation abstractions.
//!
//! The crawler drives pages only through these traits so the navigation and
//! extraction logic can run against any backend:
//! - `chrome`: Chromium over the DevTools protocol (feature `chrome`)
//! - `fake`: scripted pages for tests
//!
//! Element lookups here never wait. Bounded waiting lives in [`ElementQuery`].

#[cfg(feature = "chrome")]
pub mod chrome;
#[cfg(test)]
pub mod fake;
mod query;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

pub use query::ElementQuery;

/// Attribute carrying an element's accessible label.
pub const ACCESSIBLE_LABEL: &str = "aria-label";

/// A CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector(String);

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    /// Match any element whose `attr` contains `value` as a substring.
    pub fn attribute_contains(attr: &str, value: &str) -> Self {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        Self(format!("[{attr}*=\"{escaped}\"]"))
    }

    /// Match any element whose accessible label contains `label`.
    pub fn labelled(label: &str) -> Self {
        Self::attribute_contains(ACCESSIBLE_LABEL, label)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A browser that can open independent pages.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Open a fresh blank page owned by the caller.
    async fn open_page(&self) -> Result<Box<dyn PageHandle>>;
}

/// A single open page.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Navigate to `url` and wait for the load to finish.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// The page's current URL.
    async fn current_url(&self) -> Result<String>;

    /// All elements currently matching `selector`, in document order.
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementHandle>>>;

    /// Scroll by the given offset at the current pointer position.
    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<()>;

    /// Close the page.
    async fn close(&self) -> Result<()>;
}

/// An element on an open page.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Rendered text content.
    async fn text(&self) -> Result<String>;

    async fn click(&self) -> Result<()>;

    /// Descendants matching `selector`, in document order.
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementHandle>>>;
}
