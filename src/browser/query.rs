//! Bounded-wait element lookups.
//!
//! A lookup that times out is a normal outcome (`None` / `false` / empty
//! string). Any other failure from the page is returned as an error and is
//! fatal to the calling task.

use std::time::Duration;

use tokio::time::Instant;

use crate::browser::{ACCESSIBLE_LABEL, ElementHandle, PageHandle, Selector};
use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Element lookups against one page with a bounded wait.
pub struct ElementQuery<'a> {
    page: &'a dyn PageHandle,
    timeout: Duration,
    required_timeout: Duration,
    poll_interval: Duration,
}

impl<'a> ElementQuery<'a> {
    pub fn new(page: &'a dyn PageHandle, config: &CrawlerConfig) -> Self {
        Self {
            page,
            timeout: config.element_timeout(),
            required_timeout: config.required_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    /// Poll for the first element matching `selector` until `timeout` elapses.
    ///
    /// The page is always queried at least once.
    pub async fn wait_for(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Option<Box<dyn ElementHandle>>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(element) = self.page.find_all(selector).await?.into_iter().next() {
                return Ok(Some(element));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// First element matching `selector` within the optional-field timeout.
    pub async fn first(&self, selector: &Selector) -> Result<Option<Box<dyn ElementHandle>>> {
        self.wait_for(selector, self.timeout).await
    }

    /// Whether `selector` resolves within the optional-field timeout.
    pub async fn is_available(&self, selector: &Selector) -> Result<bool> {
        Ok(self.first(selector).await?.is_some())
    }

    /// First element matching `selector`; a timeout is a `MissingField` error.
    pub async fn required(
        &self,
        field: &str,
        selector: &Selector,
    ) -> Result<Box<dyn ElementHandle>> {
        self.wait_for(selector, self.required_timeout)
            .await?
            .ok_or_else(|| AppError::missing_field(field, selector.as_str()))
    }

    /// Accessible label of the first element whose label contains `label`.
    ///
    /// Empty if no such element appears in time.
    pub async fn attribute_with_label(&self, label: &str) -> Result<String> {
        match self.first(&Selector::labelled(label)).await? {
            Some(element) => Ok(element
                .attribute(ACCESSIBLE_LABEL)
                .await?
                .unwrap_or_default()),
            None => Ok(String::new()),
        }
    }

    /// Like [`attribute_with_label`](Self::attribute_with_label) with the
    /// label fragment removed, e.g. `"Address: 1 Main St"` becomes `"1 Main St"`.
    pub async fn text_without_label(&self, label: &str) -> Result<String> {
        let value = self.attribute_with_label(label).await?;
        Ok(value.replace(label, "").trim().to_string())
    }
}
