// src/pipeline/paginate.rs

//! Sequential pagination over one source.

use std::time::Duration;

use crate::error::Result;
use crate::models::{CrawlerConfig, RawListing};
use crate::services::SourceAdapter;

/// Drives a source page by page, starting at page 1.
///
/// Stops when the collected count reaches the reported total, when a page
/// comes back empty, or at the page ceiling. Any page failure aborts the
/// whole pass.
#[derive(Debug, Clone)]
pub struct Paginator {
    max_pages: u32,
    delay: Duration,
}

impl Paginator {
    pub fn new(max_pages: u32, delay: Duration) -> Self {
        Self { max_pages, delay }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_pages,
            Duration::from_millis(config.request_delay_ms),
        )
    }

    /// Collect every listing the source reports, in page order.
    pub async fn paginate(&self, source: &dyn SourceAdapter) -> Result<Vec<RawListing>> {
        let mut items = Vec::new();

        for page in 1..=self.max_pages {
            if page > 1 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let listing = source.fetch_page(page).await?;
            if listing.items.is_empty() {
                log::debug!("[{}] page {} is empty, stopping", source.name(), page);
                return Ok(items);
            }

            items.extend(listing.items);
            log::debug!(
                "[{}] page {} done, {} listings so far",
                source.name(),
                page,
                items.len()
            );

            if listing.total.is_some_and(|total| items.len() >= total) {
                return Ok(items);
            }
        }

        log::warn!(
            "[{}] stopped at the {}-page ceiling with {} listings",
            source.name(),
            self.max_pages,
            items.len()
        );
        Ok(items)
    }
}
