// src/services/resolver.rs

//! Search-to-listing navigation.
//!
//! Opens the search view for a query and keeps polling until the page lands
//! on a single listing. The results list can re-render or auto-navigate after
//! load, so each iteration re-reads the URL and, once the view has changed,
//! follows the first result whose label starts with the same two words as
//! the query.

use crate::browser::{ACCESSIBLE_LABEL, PageHandle, Selector};
use crate::error::Result;
use crate::models::Config;
use crate::utils::{first_two_words_match, path_contains, resolve_url, search_url};

/// Final outcome of resolving one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The page shows a single listing at `url`.
    Resolved { url: String },
    /// The page never left the search view.
    NotFound { iterations: usize },
}

/// States of the navigation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolverState {
    Searching,
    Navigating(String),
    Resolved(String),
    Aborted,
    NotFound,
}

/// Resolves free-text queries to listing pages.
pub struct ListingResolver<'a> {
    config: &'a Config,
}

impl<'a> ListingResolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Drive `page` from the search view for `query` to a listing.
    ///
    /// Not finding a listing is an `Ok` outcome; only automation failures
    /// are errors.
    pub async fn resolve(&self, page: &dyn PageHandle, query: &str) -> Result<Resolution> {
        let site = &self.config.site;
        let crawler = &self.config.crawler;
        let start_url = search_url(&site.search_url_template, &site.language, query);
        let links = Selector::attribute_contains("href", &site.listing_marker);

        log::info!("Visiting: {}", start_url);
        page.navigate(&start_url).await?;

        let mut state = ResolverState::Searching;
        let mut iterations = 0;

        loop {
            log::debug!("[{}] resolver state: {:?}", query, state);

            state = match state {
                ResolverState::Searching => {
                    let current = page.current_url().await?;

                    if !path_contains(&current, &site.search_marker) {
                        ResolverState::Resolved(current)
                    } else if iterations >= crawler.max_resolve_iterations {
                        ResolverState::Aborted
                    } else {
                        iterations += 1;

                        let target = if current != start_url {
                            self.find_match(page, &links, query).await?
                        } else {
                            None
                        };

                        match target {
                            Some(href) => ResolverState::Navigating(resolve_url(&current, &href)),
                            None => {
                                tokio::time::sleep(crawler.pacing()).await;
                                ResolverState::Searching
                            }
                        }
                    }
                }
                ResolverState::Navigating(url) => {
                    log::debug!("[{}] following result {}", query, url);
                    page.navigate(&url).await?;
                    tokio::time::sleep(crawler.pacing()).await;
                    ResolverState::Searching
                }
                ResolverState::Aborted => {
                    log::debug!(
                        "[{}] gave up after {} iterations in the search view",
                        query,
                        iterations
                    );
                    ResolverState::NotFound
                }
                ResolverState::Resolved(url) => {
                    if !path_contains(&url, &site.listing_marker) {
                        log::warn!("[{}] left the search view for an unexpected page: {}", query, url);
                    }
                    return Ok(Resolution::Resolved { url });
                }
                ResolverState::NotFound => return Ok(Resolution::NotFound { iterations }),
            };
        }
    }

    /// Target of the first result link whose label matches `query` and that
    /// has one.
    async fn find_match(
        &self,
        page: &dyn PageHandle,
        links: &Selector,
        query: &str,
    ) -> Result<Option<String>> {
        for link in page.find_all(links).await? {
            let label = link.attribute(ACCESSIBLE_LABEL).await?.unwrap_or_default();
            if !first_two_words_match(query, &label) {
                continue;
            }
            if let Some(href) = link.attribute("href").await? {
                return Ok(Some(href));
            }
        }
        Ok(None)
    }
}
