// src/services/sources/json_api.rs

//! JSON listing API source (jobs.af style).
//!
//! - List: `{api_base}/jobs/latest-jobs?filter={"page":N}` → `{ data: [...], total: N }`
//! - Detail: `{api_base}/jobs/{slug}` → one JSON object
//! - Identity: the item's `slug`

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{DetailDocument, JsonApiConfig, ListingPage, RawListing};
use crate::services::sources::SourceAdapter;
use crate::utils::extract::{Fallback, non_empty};
use crate::utils::http::fetch_json;

const TITLE_KEYS: &[&str] = &["position_title", "title", "position"];
const COMPANY_KEYS: &[&str] = &["company_name", "company.name", "company", "organization"];
const LOCATION_KEYS: &[&str] = &["locations", "location", "province"];
const POSTED_KEYS: &[&str] = &["published_at", "created_at", "posted_at"];
const EXPIRES_KEYS: &[&str] = &["close_date", "expire_date", "deadline"];

/// Source backed by a paginated JSON API.
pub struct JsonApiSource {
    config: JsonApiConfig,
    client: reqwest::Client,
    api_base: Url,
}

impl JsonApiSource {
    pub fn new(config: JsonApiConfig, client: reqwest::Client) -> Result<Self> {
        let api_base = Url::parse(&format!("{}/", config.api_base.trim_end_matches('/')))?;
        Url::parse(&config.site_base)?;
        Ok(Self {
            config,
            client,
            api_base,
        })
    }

    fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = self.api_base.join("jobs/latest-jobs")?;
        url.query_pairs_mut()
            .append_pair("filter", &json!({ "page": page }).to_string());
        Ok(url)
    }

    fn detail_url(&self, slug: &str) -> Result<Url> {
        let mut url = self.api_base.join("jobs/")?;
        url.path_segments_mut()
            .map_err(|_| AppError::config("api_base cannot be a base URL"))?
            .pop_if_empty()
            .push(slug);
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for JsonApiSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
        let url = self.page_url(page)?;
        log::debug!("[{}] fetching {}", self.config.name, url);
        let body: Value = fetch_json(&self.client, url.as_str()).await?;
        parse_listing_page(&self.config.name, &body)
    }

    async fn fetch_detail(&self, listing: &RawListing) -> Result<DetailDocument> {
        let url = self.detail_url(&listing.detail_ref)?;
        log::debug!("[{}] fetching detail {}", self.config.name, url);
        let body: Value = fetch_json(&self.client, url.as_str()).await?;
        DetailDocument::try_from(body)
    }

    fn record_key(&self, listing: &RawListing) -> String {
        listing.identity.clone()
    }

    fn posting_url(&self, listing: &RawListing) -> String {
        format!(
            "{}/jobs/{}",
            self.config.site_base.trim_end_matches('/'),
            listing.identity
        )
    }
}

/// Decode one listing response.
pub(crate) fn parse_listing_page(source: &str, body: &Value) -> Result<ListingPage> {
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::source_error(source, "listing response has no 'data' array"))?;

    let total = body.get("total").and_then(|t| match t {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    });

    let mut items = Vec::with_capacity(data.len());
    for item in data {
        match item.as_object().and_then(listing_from_item) {
            Some(listing) => items.push(listing),
            None => log::warn!("[{}] skipping listing without slug: {}", source, item),
        }
    }

    Ok(ListingPage::new(items, total))
}

fn listing_from_item(item: &Map<String, Value>) -> Option<RawListing> {
    let slug = item.get("slug").and_then(Value::as_str).and_then(non_empty)?;

    let mut listing = RawListing::new(slug.clone(), slug);
    listing.title = field(item, TITLE_KEYS);
    listing.company = field(item, COMPANY_KEYS);
    listing.location = field(item, LOCATION_KEYS);
    listing.posted = field(item, POSTED_KEYS);
    listing.expires = field(item, EXPIRES_KEYS);
    listing.extra = item.clone();
    Some(listing)
}

/// First non-empty value among `paths` (dotted paths reach into objects).
fn field(item: &Map<String, Value>, paths: &[&'static str]) -> String {
    paths
        .iter()
        .fold(Fallback::new(), |chain, &path| {
            chain.or_try(path, move || lookup(item, path).and_then(value_text))
        })
        .resolve()
        .unwrap_or_default()
}

fn lookup<'a>(item: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = item.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s.trim()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            non_empty(parts.join(", "))
        }
        Value::Object(map) => map.get("name").and_then(value_text),
        _ => None,
    }
}
