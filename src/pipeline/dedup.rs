//! New-listing detection against the identity ledger.
//!
//! Computes which freshly paginated listings have never been seen before.
//! Identity comparison is exact string equality; there is no fuzzy matching.

use std::collections::HashSet;

use crate::models::{IdentityLedger, RawListing};

/// Result of comparing one run's listings with the ledger.
#[derive(Debug, Clone, Default)]
pub struct DedupResult {
    /// Listings whose identity is absent from the ledger, in page order
    pub new_listings: Vec<RawListing>,
    /// Listings already in the ledger
    pub known: usize,
    /// Repeats of an identity earlier in the same run
    pub repeated: usize,
}

impl DedupResult {
    pub fn has_new(&self) -> bool {
        !self.new_listings.is_empty()
    }
}

/// Splits a run's listings into new and already-seen.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Listings in `current` that `ledger` has never seen.
    ///
    /// A listing appearing twice in `current` (e.g. shifted across a page
    /// boundary) is kept once, at its first position.
    pub fn find_new(&self, ledger: &IdentityLedger, current: &[RawListing]) -> DedupResult {
        let known_ids = ledger.identities();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut result = DedupResult::default();

        for listing in current {
            let id = listing.identity.as_str();
            if known_ids.contains(id) {
                result.known += 1;
            } else if !seen.insert(id) {
                result.repeated += 1;
            } else {
                result.new_listings.push(listing.clone());
            }
        }

        result
    }
}
