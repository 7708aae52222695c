// src/lib.rs

//! jobfeed library
//!
//! Ingests job postings from listing sites, deduplicates them against a
//! per-source ledger, enriches new postings through an AI completion backend,
//! persists each enriched record and announces it on a notification channel.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
