// src/services/details.rs

//! Listing detail extraction.
//!
//! Reads a resolved listing page into a [`Place`]. Title and category are
//! mandatory; every other field degrades to empty or zero when its element
//! does not show up in time.

use crate::browser::{ElementHandle, ElementQuery, PageHandle, Selector};
use crate::error::Result;
use crate::models::{Config, Place};
use crate::utils::{clean_review_text, coordinates, parse_int, rating_from_label, star_bucket};

/// Accessible-label fragments of the per-star review counts.
const STAR_BUCKETS: [(u8, &str); 5] = [
    (5, "5 stars"),
    (4, "4 stars"),
    (3, "3 stars"),
    (2, "2 stars"),
    (1, "1 star"),
];

/// Extracts listing details from a resolved page.
pub struct DetailExtractor<'a> {
    config: &'a Config,
}

impl<'a> DetailExtractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Build the full record for the listing currently shown at `url`.
    ///
    /// Clicks and scrolls the live page, so calling it twice on the same
    /// page is not idempotent.
    pub async fn extract(&self, page: &dyn PageHandle, url: &str) -> Result<Place> {
        let query = ElementQuery::new(page, &self.config.crawler);
        let selectors = &self.config.selectors;

        let mut place = Place {
            name: required_text(&query, "title", &selectors.title).await?,
            category: required_text(&query, "category", &selectors.category).await?,
            address: query.text_without_label("Address: ").await?,
            website: query.text_without_label("Website: ").await?,
            phone: query.text_without_label("Phone: ").await?,
            review_count: parse_int(&query.text_without_label(" reviews").await?),
            stars: rating_from_label(&query.attribute_with_label(" stars").await?),
            latlon: coordinates(url),
            ..Place::default()
        };

        for (stars, label) in STAR_BUCKETS {
            let count = star_bucket(&query.attribute_with_label(label).await?);
            place.set_bucket(stars, count);
        }

        place.reviews = self.collect_reviews(page, &query, place.review_count).await?;
        Ok(place)
    }

    /// Open the full review list if offered, then read every rendered review.
    async fn collect_reviews(
        &self,
        page: &dyn PageHandle,
        query: &ElementQuery<'_>,
        review_count: u64,
    ) -> Result<Vec<String>> {
        let selectors = &self.config.selectors;
        let more = Selector::labelled(&selectors.more_reviews_label);

        if let Some(control) = query.first(&more).await? {
            control.click().await?;
            self.scroll_reviews(page, review_count).await?;
        }

        let containers = page
            .find_all(&Selector::css(&selectors.review_container))
            .await?;
        if containers.is_empty() {
            return Ok(Vec::new());
        }

        log::info!("Parsing {} reviews...", containers.len());
        let mut reviews = Vec::with_capacity(containers.len());

        for (i, container) in containers.iter().enumerate() {
            match self.review_text(container.as_ref()).await {
                Ok(Some(text)) => reviews.push(text),
                Ok(None) => {}
                Err(e) => log::warn!("Skipping review #{}: {}", i + 1, e),
            }
        }

        Ok(reviews)
    }

    /// Scroll until `target` reviews are rendered, the rendered count stops
    /// growing, or the step budget runs out.
    ///
    /// Returns the last rendered count.
    async fn scroll_reviews(&self, page: &dyn PageHandle, target: u64) -> Result<usize> {
        let crawler = &self.config.crawler;
        let items = Selector::css(&self.config.selectors.review_item);
        let mut rendered = page.find_all(&items).await?.len();
        let mut steps = 0;
        let mut stalled = 0;

        log::info!("Scrolling review pages...");

        while (rendered as u64) < target {
            if steps >= crawler.max_scroll_iterations {
                log::warn!(
                    "Stopped scrolling after {} steps with {}/{} reviews rendered",
                    steps,
                    rendered,
                    target
                );
                break;
            }

            let count = page.find_all(&items).await?.len();
            if count > rendered {
                stalled = 0;
            } else if steps > 0 {
                stalled += 1;
            }
            rendered = count;

            if stalled >= crawler.max_stalled_scrolls {
                log::warn!(
                    "Stopped scrolling after {} steps without new reviews, {}/{} rendered",
                    stalled,
                    rendered,
                    target
                );
                break;
            }

            log::info!("Scrolling: {}/{}", rendered, target);
            page.scroll_by(0.0, crawler.scroll_offset).await?;
            tokio::time::sleep(crawler.pacing()).await;
            steps += 1;
        }

        Ok(rendered)
    }

    /// Expand a truncated review if needed and read its text.
    async fn review_text(&self, container: &dyn ElementHandle) -> Result<Option<String>> {
        let selectors = &self.config.selectors;

        let expand = container
            .find_all(&Selector::css(&selectors.review_expand))
            .await?;
        if let Some(control) = expand.first() {
            control.click().await?;
            tokio::time::sleep(self.config.crawler.expand_delay()).await;
        }

        let spans = container
            .find_all(&Selector::css(&selectors.review_text))
            .await?;
        match spans.first() {
            // `&` is dropped rather than replaced, leaving its surrounding spaces.
            Some(span) => Ok(Some(clean_review_text(&span.text().await?))),
            None => Ok(None),
        }
    }
}

/// Trimmed text of a mandatory element.
async fn required_text(query: &ElementQuery<'_>, field: &str, selector: &str) -> Result<String> {
    let element = query.required(field, &Selector::css(selector)).await?;
    Ok(element.text().await?.trim().to_string())
}
