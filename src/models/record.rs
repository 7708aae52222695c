//! Durable per-posting record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::StructuredPosting;

/// Field under which the structured posting is embedded.
pub const SUMMARY_FIELD: &str = "summarized";

/// Source content plus the structured posting derived from it.
///
/// Written once, never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub content: Map<String, Value>,

    pub summarized: StructuredPosting,
}

impl EnrichedRecord {
    /// Embed `posting` into `content`, dropping any stale summary field.
    pub fn new(mut content: Map<String, Value>, posting: StructuredPosting) -> Self {
        content.remove(SUMMARY_FIELD);
        Self {
            content,
            summarized: posting,
        }
    }
}
