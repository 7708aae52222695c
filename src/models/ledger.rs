//! Identity ledger: every listing a source has ever shown us.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::RawListing;

/// Append-only record of seen listings for one source.
///
/// Serialized as a plain JSON array of listing summaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityLedger {
    entries: Vec<RawListing>,
}

impl IdentityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities currently recorded.
    pub fn identities(&self) -> HashSet<&str> {
        self.entries.iter().map(|l| l.identity.as_str()).collect()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.iter().any(|l| l.identity == identity)
    }

    /// Append listings whose identity is not yet recorded.
    ///
    /// Returns the number of entries actually added.
    pub fn append(&mut self, listings: &[RawListing]) -> usize {
        let mut known: HashSet<String> =
            self.entries.iter().map(|l| l.identity.clone()).collect();
        let before = self.entries.len();
        for listing in listings {
            if known.insert(listing.identity.clone()) {
                self.entries.push(listing.clone());
            }
        }
        self.entries.len() - before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identities present in `self` but missing from `other`.
    pub fn missing_from<'a>(&'a self, other: &IdentityLedger) -> Vec<&'a str> {
        let theirs = other.identities();
        self.entries
            .iter()
            .map(|l| l.identity.as_str())
            .filter(|id| !theirs.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str) -> RawListing {
        RawListing::new(id, id)
    }

    #[test]
    fn test_append_skips_known() {
        let mut ledger = IdentityLedger::new();
        assert_eq!(ledger.append(&[listing("A"), listing("B")]), 2);
        assert_eq!(ledger.append(&[listing("B"), listing("C"), listing("C")]), 1);
        assert_eq!(ledger.len(), 3);
        assert!(ledger.contains("C"));
    }

    #[test]
    fn test_serializes_as_array() {
        let mut ledger = IdentityLedger::new();
        ledger.append(&[listing("A")]);
        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["identity"], "A");

        let back: IdentityLedger = serde_json::from_value(json).unwrap();
        assert!(back.contains("A"));
    }

    #[test]
    fn test_missing_from() {
        let mut old = IdentityLedger::new();
        old.append(&[listing("A"), listing("B")]);
        let mut new = IdentityLedger::new();
        new.append(&[listing("A")]);
        assert_eq!(old.missing_from(&new), vec!["B"]);
        assert!(new.missing_from(&old).is_empty());
    }
}
