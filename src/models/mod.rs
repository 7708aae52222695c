// src/models/mod.rs

//! Domain models for the job feed.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod detail;
mod ledger;
mod listing;
mod posting;
mod record;
mod selectors;

// Re-export all public types
pub use config::{
    AiConfig, Config, CrawlerConfig, HtmlBoardConfig, JsonApiConfig, NotifierConfig,
    ScheduleConfig, SourceConfig, StorageConfig,
};
pub use detail::DetailDocument;
pub use ledger::IdentityLedger;
pub use listing::{ListingPage, RawListing};
pub use posting::{
    EducationDegree, Gender, Locations, MAX_SKILLS, MIN_SKILLS, StructuredPosting,
    normalize_skill, normalize_skills,
};
pub use record::{EnrichedRecord, SUMMARY_FIELD};
pub use selectors::{DetailSelectors, ListingSelectors, SectionHeading};
