// src/pipeline/crawl.rs

//! Place crawling pipeline.
//!
//! One task per query, all started at once on a shared browser session, each
//! on its own page. Results are gathered in completion order and written as
//! a single JSON array once every task has reported.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};

use crate::browser::{BrowserSession, PageHandle};
use crate::error::Result;
use crate::models::{Config, Place};
use crate::services::{DetailExtractor, ListingResolver, Resolution};
use crate::storage::PlaceStorage;

/// Result of crawling a single query.
#[derive(Debug)]
pub enum CrawlOutcome {
    Found(Place),
    NotFound,
    Failed(String),
}

/// Summary of a crawl run.
#[derive(Debug)]
pub struct CrawlSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub query_count: usize,
    pub place_count: usize,
    /// Queries that never resolved to a listing
    pub skipped: Vec<String>,
    /// Queries whose task failed, with the reason
    pub failed: Vec<(String, String)>,
    /// Where the output was written
    pub location: String,
}

impl CrawlSummary {
    fn log(&self) {
        let elapsed = self.end_time - self.start_time;
        log::info!(
            "Crawled {} queries in {}s: {} found, {} skipped, {} failed",
            self.query_count,
            elapsed.num_seconds(),
            self.place_count,
            self.skipped.len(),
            self.failed.len()
        );

        for query in &self.skipped {
            log::info!("    skipped: {}", query);
        }
        for (query, reason) in &self.failed {
            log::info!("    failed: {} ({})", query, reason);
        }
        log::info!("Places saved to {}", self.location);
    }
}

/// Crawl every configured query concurrently and write the aggregate.
///
/// Per-query failures are isolated and reported in the summary. Only an
/// output write failure fails the run.
pub async fn run_crawler(
    config: Arc<Config>,
    session: Arc<dyn BrowserSession>,
    storage: &dyn PlaceStorage,
) -> Result<CrawlSummary> {
    let start_time = Utc::now();
    log::info!("Crawling {} queries", config.queries.len());

    let mut tasks: FuturesUnordered<_> = config
        .queries
        .iter()
        .map(|query| {
            let config = Arc::clone(&config);
            let session = Arc::clone(&session);
            let task_query = query.clone();

            tokio::spawn(async move { crawl_query(&config, session.as_ref(), &task_query).await })
                .map({
                    let query = query.clone();
                    move |joined| (query, joined)
                })
        })
        .collect();

    let mut places = Vec::new();
    let mut skipped = Vec::new();
    let mut failed = Vec::new();

    while let Some((query, joined)) = tasks.next().await {
        let outcome =
            joined.unwrap_or_else(|e| CrawlOutcome::Failed(format!("task aborted: {e}")));

        match outcome {
            CrawlOutcome::Found(place) => places.push(place),
            CrawlOutcome::NotFound => skipped.push(query),
            CrawlOutcome::Failed(reason) => {
                log::error!("Crawl failed for '{}': {}", query, reason);
                failed.push((query, reason));
            }
        }
    }

    let location = storage.write_places(&places).await?;

    let summary = CrawlSummary {
        start_time,
        end_time: Utc::now(),
        query_count: config.queries.len(),
        place_count: places.len(),
        skipped,
        failed,
        location,
    };
    summary.log();

    Ok(summary)
}

/// Crawl a single query on a fresh page from `session`.
pub async fn crawl_query(config: &Config, session: &dyn BrowserSession, query: &str) -> CrawlOutcome {
    let page = match session.open_page().await {
        Ok(page) => page,
        Err(e) => return CrawlOutcome::Failed(e.to_string()),
    };

    let result = crawl_page(config, page.as_ref(), query).await;

    if let Err(e) = page.close().await {
        log::debug!("Failed to close page for '{}': {}", query, e);
    }

    match result {
        Ok(Some(place)) => CrawlOutcome::Found(place),
        Ok(None) => CrawlOutcome::NotFound,
        Err(e) => CrawlOutcome::Failed(e.to_string()),
    }
}

/// Resolve `query` to its listing URL on a fresh page from `session`.
///
/// The page is closed whether or not resolution succeeds.
pub async fn resolve_query(
    config: &Config,
    session: &dyn BrowserSession,
    query: &str,
) -> Result<Resolution> {
    let page = session.open_page().await?;
    let resolution = ListingResolver::new(config).resolve(page.as_ref(), query).await;

    if let Err(e) = page.close().await {
        log::debug!("Failed to close page for '{}': {}", query, e);
    }
    resolution
}

async fn crawl_page(config: &Config, page: &dyn PageHandle, query: &str) -> Result<Option<Place>> {
    match ListingResolver::new(config).resolve(page, query).await? {
        Resolution::NotFound { .. } => {
            log::info!("Skipping: {}, place not found.", query);
            Ok(None)
        }
        Resolution::Resolved { url } => {
            log::info!("CurrentURL: {}", url);
            let place = DetailExtractor::new(config).extract(page, &url).await?;
            Ok(Some(place))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Selector;
    use crate::browser::fake::{FakeBrowser, FakeElement, FakePage};
    use crate::storage::LocalStorage;
    use crate::utils::search_url;
    use tempfile::TempDir;

    const PLACE: &str =
        "https://www.google.com/maps/place/Laba+Africa+Expeditions/@-3.3731,36.6848,17z/data=!3m1";

    fn search_for(config: &Config, query: &str) -> String {
        search_url(
            &config.site.search_url_template,
            &config.site.language,
            query,
        )
    }

    fn listing(config: &Config, search: &str, url: &str, name: &str) -> FakePage {
        FakePage::new()
            .with_urls([search, url])
            .with_elements(&config.selectors.title, vec![FakeElement::new().with_text(name)])
            .with_elements(
                &config.selectors.category,
                vec![FakeElement::new().with_text("Tour operator")],
            )
    }

    fn read_output(storage: &LocalStorage) -> Vec<Place> {
        let bytes = std::fs::read(storage.path()).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_query_end_to_end() {
        let config = Config {
            queries: vec!["Laba africa expeditions".to_string()],
            ..Config::default()
        };
        let search = search_for(&config, "Laba africa expeditions");
        let browser = FakeBrowser::new().route(
            &search,
            listing(&config, &search, PLACE, "Laba Africa Expeditions"),
        );
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("places.json"));

        let summary = run_crawler(Arc::new(config), Arc::new(browser), &storage)
            .await
            .unwrap();

        assert_eq!(summary.place_count, 1);
        let places = read_output(&storage);
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Laba Africa Expeditions");
        assert_eq!(places[0].category, "Tour operator");
        assert_eq!(places[0].review_count, 0);
        assert!(places[0].reviews.is_empty());
        assert_eq!(places[0].latlon, "-3.3731,36.6848");
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_and_failed_queries_are_isolated() {
        let queries = ["Laba africa expeditions", "Kilimanjaro Camp", "Nowhere Tours", "Broken Lodge"];
        let config = Config {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            ..Config::default()
        };

        let laba = search_for(&config, queries[0]);
        let kili = search_for(&config, queries[1]);
        let broken = search_for(&config, queries[3]);
        let broken_page = FakePage::new()
            .with_urls([broken.as_str(), "https://www.google.com/maps/place/Broken+Lodge/@1,2,3z/"])
            .failing(&config.selectors.title);

        let browser = FakeBrowser::new()
            .route(&laba, listing(&config, &laba, PLACE, "Laba Africa Expeditions"))
            .route(
                &kili,
                listing(
                    &config,
                    &kili,
                    "https://www.google.com/maps/place/Kilimanjaro+Camp/@-3.06,37.35,15z/",
                    "Kilimanjaro Camp",
                ),
            )
            .route(&broken, broken_page.clone());

        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("places.json"));

        let summary = run_crawler(Arc::new(config), Arc::new(browser.clone()), &storage)
            .await
            .unwrap();

        assert_eq!(browser.opened(), 4);
        assert!(broken_page.is_closed());
        assert_eq!(summary.query_count, 4);
        assert_eq!(summary.place_count, 2);
        assert_eq!(summary.skipped, vec!["Nowhere Tours".to_string()]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "Broken Lodge");

        let mut names: Vec<String> = read_output(&storage).into_iter().map(|p| p.name).collect();
        names.sort();
        assert_eq!(names, vec!["Kilimanjaro Camp", "Laba Africa Expeditions"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_task_is_reported_as_failed() {
        let queries = ["Laba africa expeditions", "Crashing Camp"];
        let config = Config {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            ..Config::default()
        };
        let laba = search_for(&config, queries[0]);
        let crashing = search_for(&config, queries[1]);
        let browser = FakeBrowser::new()
            .route(&laba, listing(&config, &laba, PLACE, "Laba Africa Expeditions"))
            .route(&crashing, FakePage::new().panicking());

        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("places.json"));

        let summary = run_crawler(Arc::new(config), Arc::new(browser), &storage)
            .await
            .unwrap();

        assert_eq!(summary.place_count, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "Crashing Camp");
        assert!(summary.failed[0].1.contains("panic"));

        let places = read_output(&storage);
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "Laba Africa Expeditions");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_query_closes_page() {
        let config = Config::default();
        let search = search_for(&config, "Laba africa expeditions");
        let page = FakePage::new().with_urls([search.as_str(), PLACE]);
        let browser = FakeBrowser::new().route(&search, page.clone());

        let resolution = resolve_query(&config, &browser, "Laba africa expeditions")
            .await
            .unwrap();

        assert_eq!(resolution, Resolution::Resolved { url: PLACE.to_string() });
        assert!(page.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_query_closes_page_on_error() {
        let config = Config::default();
        let search = search_for(&config, "Laba africa expeditions");
        let changed = format!("{search}@-3.37,36.68,12z");
        let page = FakePage::new()
            .with_urls([search.as_str(), changed.as_str()])
            .failing(&Selector::attribute_contains("href", &config.site.listing_marker).to_string());
        let browser = FakeBrowser::new().route(&search, page.clone());

        let result = resolve_query(&config, &browser, "Laba africa expeditions").await;

        assert!(result.is_err());
        assert!(page.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_mandatory_field_fails_task() {
        let config = Config::default();
        let search = search_for(&config, "Laba africa expeditions");
        let browser = FakeBrowser::new().route(
            &search,
            FakePage::new().with_urls([search.as_str(), PLACE]),
        );

        let outcome = crawl_query(&config, &browser, "Laba africa expeditions").await;

        match outcome {
            CrawlOutcome::Failed(reason) => assert!(reason.contains("title")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_not_found_writes_empty_array() {
        let config = Config {
            queries: vec!["Nowhere Tours".to_string(), "Ghost Lodge".to_string()],
            ..Config::default()
        };
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("places.json"));

        let summary = run_crawler(Arc::new(config), Arc::new(FakeBrowser::new()), &storage)
            .await
            .unwrap();

        assert_eq!(summary.place_count, 0);
        assert_eq!(summary.skipped.len(), 2);
        assert!(read_output(&storage).is_empty());
    }
}
