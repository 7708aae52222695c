//! Listing sources.
//!
//! Every site is reached through [`SourceAdapter`]; the pipeline never sees
//! a site's markup or API shape.

mod html_board;
mod json_api;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::models::{Config, DetailDocument, ListingPage, RawListing, SourceConfig};

pub use html_board::HtmlBoardSource;
pub use json_api::JsonApiSource;

/// One listing site.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable name; also the ledger and record directory name.
    fn name(&self) -> &str;

    /// Fetch listing page `page` (1-based).
    async fn fetch_page(&self, page: u32) -> Result<ListingPage>;

    /// Fetch the full content for one listing.
    async fn fetch_detail(&self, listing: &RawListing) -> Result<DetailDocument>;

    /// Normalized identity used as the record file name.
    fn record_key(&self, listing: &RawListing) -> String;

    /// Public URL of the posting.
    fn posting_url(&self, listing: &RawListing) -> String;

    /// Document handed to the structuring engine.
    fn enrichment_input(&self, _listing: &RawListing, detail: &DetailDocument) -> Value {
        Value::Object(detail.fields().clone())
    }

    /// Content persisted alongside the structured posting.
    fn record_content(&self, _listing: &RawListing, detail: DetailDocument) -> Map<String, Value> {
        detail.into_fields()
    }
}

/// Build adapters for every enabled source in `config`.
pub fn build_sources(
    config: &Config,
    client: &reqwest::Client,
) -> Result<Vec<Box<dyn SourceAdapter>>> {
    config
        .enabled_sources()
        .map(|source| build_source(source, client))
        .collect()
}

/// Build a single adapter.
pub fn build_source(
    source: &SourceConfig,
    client: &reqwest::Client,
) -> Result<Box<dyn SourceAdapter>> {
    Ok(match source {
        SourceConfig::JsonApi(c) => Box::new(JsonApiSource::new(c.clone(), client.clone())?),
        SourceConfig::HtmlBoard(c) => Box::new(HtmlBoardSource::new(c.clone(), client.clone())?),
    })
}
