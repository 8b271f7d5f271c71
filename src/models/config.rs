//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Free-text queries, one crawl task each
    #[serde(default)]
    pub queries: Vec<String>,

    /// Timing and loop bounds
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Search URL construction and view detection
    #[serde(default)]
    pub site: SiteConfig,

    /// Element selectors for the listing page
    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.queries.is_empty() {
            return Err(AppError::validation("No queries defined"));
        }
        if let Some(i) = self.queries.iter().position(|q| q.trim().is_empty()) {
            return Err(AppError::validation(format!("queries[{i}] is blank")));
        }
        if self.crawler.element_timeout_ms == 0 {
            return Err(AppError::validation(
                "crawler.element_timeout_ms must be > 0",
            ));
        }
        if self.crawler.required_timeout_ms == 0 {
            return Err(AppError::validation(
                "crawler.required_timeout_ms must be > 0",
            ));
        }
        if self.crawler.poll_interval_ms == 0 {
            return Err(AppError::validation("crawler.poll_interval_ms must be > 0"));
        }
        if self.crawler.max_resolve_iterations == 0 {
            return Err(AppError::validation(
                "crawler.max_resolve_iterations must be > 0",
            ));
        }
        if self.crawler.max_scroll_iterations == 0 {
            return Err(AppError::validation(
                "crawler.max_scroll_iterations must be > 0",
            ));
        }
        if self.crawler.max_stalled_scrolls == 0 {
            return Err(AppError::validation(
                "crawler.max_stalled_scrolls must be > 0",
            ));
        }
        if !self.site.search_url_template.contains("{query}") {
            return Err(AppError::validation(
                "site.search_url_template must contain {query}",
            ));
        }
        if self.site.search_marker.is_empty() || self.site.listing_marker.is_empty() {
            return Err(AppError::validation("site markers must not be empty"));
        }
        if self.output.path.trim().is_empty() {
            return Err(AppError::validation("output.path is empty"));
        }
        Ok(())
    }
}

/// Timing and loop bounds for a crawl task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Bounded wait for optional elements
    #[serde(default = "defaults::element_timeout")]
    pub element_timeout_ms: u64,

    /// Bounded wait for mandatory elements (title, category)
    #[serde(default = "defaults::required_timeout")]
    pub required_timeout_ms: u64,

    /// Delay between element lookups while waiting
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,

    /// Delay after each resolver iteration and scroll step
    #[serde(default = "defaults::pacing")]
    pub pacing_ms: u64,

    /// Resolver gives up after this many iterations
    #[serde(default = "defaults::max_resolve_iterations")]
    pub max_resolve_iterations: usize,

    /// Delay after expanding a truncated review
    #[serde(default = "defaults::expand_delay")]
    pub expand_delay_ms: u64,

    /// Vertical wheel delta per scroll step
    #[serde(default = "defaults::scroll_offset")]
    pub scroll_offset: f64,

    /// Review scrolling stops after this many steps even if incomplete
    #[serde(default = "defaults::max_scroll_iterations")]
    pub max_scroll_iterations: usize,

    /// Review scrolling stops after this many steps in a row without new reviews
    #[serde(default = "defaults::max_stalled_scrolls")]
    pub max_stalled_scrolls: usize,
}

impl CrawlerConfig {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn required_timeout(&self) -> Duration {
        Duration::from_millis(self.required_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn expand_delay(&self) -> Duration {
        Duration::from_millis(self.expand_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            element_timeout_ms: defaults::element_timeout(),
            required_timeout_ms: defaults::required_timeout(),
            poll_interval_ms: defaults::poll_interval(),
            pacing_ms: defaults::pacing(),
            max_resolve_iterations: defaults::max_resolve_iterations(),
            expand_delay_ms: defaults::expand_delay(),
            scroll_offset: defaults::scroll_offset(),
            max_scroll_iterations: defaults::max_scroll_iterations(),
            max_stalled_scrolls: defaults::max_stalled_scrolls(),
        }
    }
}

/// Search URL construction and view detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Search URL with `{query}` and `{lang}` placeholders
    #[serde(default = "defaults::search_url_template")]
    pub search_url_template: String,

    /// Interface language hint
    #[serde(default = "defaults::language")]
    pub language: String,

    /// Path fragment of the search-results view
    #[serde(default = "defaults::search_marker")]
    pub search_marker: String,

    /// Path fragment of the single-listing view
    #[serde(default = "defaults::listing_marker")]
    pub listing_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            search_url_template: defaults::search_url_template(),
            language: defaults::language(),
            search_marker: defaults::search_marker(),
            listing_marker: defaults::listing_marker(),
        }
    }
}

/// CSS selectors and label fragments for the listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default = "defaults::title")]
    pub title: String,

    #[serde(default = "defaults::category")]
    pub category: String,

    /// Accessible-label fragment of the "more reviews" control
    #[serde(default = "defaults::more_reviews_label")]
    pub more_reviews_label: String,

    /// Rendered review elements, counted while scrolling
    #[serde(default = "defaults::review_item")]
    pub review_item: String,

    /// Review containers the text is read from
    #[serde(default = "defaults::review_container")]
    pub review_container: String,

    /// "More" control inside a truncated review
    #[serde(default = "defaults::review_expand")]
    pub review_expand: String,

    /// Review text element inside a container
    #[serde(default = "defaults::review_text")]
    pub review_text: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: defaults::title(),
            category: defaults::category(),
            more_reviews_label: defaults::more_reviews_label(),
            review_item: defaults::review_item(),
            review_container: defaults::review_container(),
            review_expand: defaults::review_expand(),
            review_text: defaults::review_text(),
        }
    }
}

/// Browser launch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run without a visible window
    #[serde(default = "defaults::headless")]
    pub headless: bool,

    /// Chrome/Chromium executable, auto-detected if absent
    #[serde(default)]
    pub executable: Option<String>,

    /// DevTools websocket of an already running browser
    #[serde(default)]
    pub ws_url: Option<String>,

    #[serde(default = "defaults::window_width")]
    pub window_width: u32,

    #[serde(default = "defaults::window_height")]
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: defaults::headless(),
            executable: None,
            ws_url: None,
            window_width: defaults::window_width(),
            window_height: defaults::window_height(),
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "defaults::output_path")]
    pub path: String,

    #[serde(default)]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: defaults::output_path(),
            pretty: false,
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn element_timeout() -> u64 {
        1000
    }
    pub fn required_timeout() -> u64 {
        30_000
    }
    pub fn poll_interval() -> u64 {
        100
    }
    pub fn pacing() -> u64 {
        1000
    }
    pub fn max_resolve_iterations() -> usize {
        30
    }
    pub fn expand_delay() -> u64 {
        2000
    }
    pub fn scroll_offset() -> f64 {
        10_000.0
    }
    pub fn max_scroll_iterations() -> usize {
        300
    }
    pub fn max_stalled_scrolls() -> usize {
        3
    }

    // Site defaults
    pub fn search_url_template() -> String {
        "https://www.google.com/maps/search/{query}/?hl={lang}".into()
    }
    pub fn language() -> String {
        "en".into()
    }
    pub fn search_marker() -> String {
        "maps/search".into()
    }
    pub fn listing_marker() -> String {
        "maps/place".into()
    }

    // Selector defaults
    pub fn title() -> String {
        "h1".into()
    }
    pub fn category() -> String {
        "button[jsaction='pane.rating.category']".into()
    }
    pub fn more_reviews_label() -> String {
        "More reviews".into()
    }
    pub fn review_item() -> String {
        "[jsaction='mouseover:pane.review.in; mouseout:pane.review.out']".into()
    }
    pub fn review_container() -> String {
        "div.MyEned".into()
    }
    pub fn review_expand() -> String {
        "[jsaction='pane.review.expandReview']".into()
    }
    pub fn review_text() -> String {
        "span".into()
    }

    // Browser defaults
    pub fn headless() -> bool {
        true
    }
    pub fn window_width() -> u32 {
        1280
    }
    pub fn window_height() -> u32 {
        900
    }

    // Output defaults
    pub fn output_path() -> String {
        "places.json".into()
    }
}
