//! Listing data structures produced by source adapters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One posting as it appears on a listing page.
///
/// Only the identity matters for deduplication; the display fields and the
/// raw source fields are kept so the ledger doubles as an audit listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawListing {
    /// Unique per source (slug or link)
    pub identity: String,

    /// Posting title
    #[serde(default)]
    pub title: String,

    /// Hiring organization
    #[serde(default)]
    pub company: String,

    /// Location as displayed by the source
    #[serde(default)]
    pub location: String,

    /// Posted timestamp or relative time, as displayed
    #[serde(default)]
    pub posted: String,

    /// Expiry/close date, as displayed
    #[serde(default)]
    pub expires: String,

    /// What the detail fetcher needs (API slug or absolute page URL)
    pub detail_ref: String,

    /// Remaining source-specific fields
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl RawListing {
    /// Create a listing with only identity and detail reference set.
    pub fn new(identity: impl Into<String>, detail_ref: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            title: String::new(),
            company: String::new(),
            location: String::new(),
            posted: String::new(),
            expires: String::new(),
            detail_ref: detail_ref.into(),
            extra: Map::new(),
        }
    }

    /// Builder-style title setter.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder-style company setter.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// The listing as a flat JSON object (display fields plus extras).
    pub fn to_object(&self) -> Map<String, Value> {
        let mut object = self.extra.clone();
        for (key, value) in [
            ("identity", &self.identity),
            ("title", &self.title),
            ("company", &self.company),
            ("location", &self.location),
            ("posted", &self.posted),
            ("expires", &self.expires),
        ] {
            if !value.is_empty() {
                object.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        object
    }
}

/// One page of listings plus the total the site claims to have.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub items: Vec<RawListing>,
    pub total: Option<usize>,
}

impl ListingPage {
    pub fn new(items: Vec<RawListing>, total: Option<usize>) -> Self {
        Self { items, total }
    }
}
