// src/pipeline/run.rs

//! The ingestion pipeline: paginate, dedup, then enrich, persist and notify
//! each new listing.
//!
//! Per source run:
//!
//! 1. Paginate the source (any page failure aborts the run, nothing written)
//! 2. Load the ledger and isolate new identities
//! 3. Save the grown ledger *before* any enrichment
//! 4. For each new listing, independently: detail → structure → persist → notify
//!
//! Item failures are logged and counted; they never stop sibling items.
//! A failed item stays in the ledger and is not retried on later runs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, EnrichedRecord, RawListing};
use crate::pipeline::{Deduplicator, Paginator};
use crate::services::{
    Notifier, OpenAiClient, SourceAdapter, StructuringEngine, build_notifier, render_message,
};
use crate::storage::{JobStorage, LocalStorage};

/// Outcome of one source run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: String,
    /// Listings returned by pagination
    pub discovered: usize,
    /// Listings absent from the ledger
    pub new_listings: usize,
    /// Listings already in the ledger
    pub known: usize,
    /// Duplicate identities within this fetch
    pub repeated: usize,
    /// Records written
    pub persisted: usize,
    /// New listings that could not be enriched or persisted
    pub failed: usize,
    /// The part of `failed` caused by network or HTTP errors
    pub transport_failures: usize,
    pub notified: usize,
    pub notify_failures: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl RunReport {
    fn started(source: &str) -> Self {
        let now = Utc::now();
        Self {
            source: source.to_string(),
            discovered: 0,
            new_listings: 0,
            known: 0,
            repeated: 0,
            persisted: 0,
            failed: 0,
            transport_failures: 0,
            notified: 0,
            notify_failures: 0,
            start_time: now,
            end_time: now,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }
}

/// Sequences sources, storage, structuring and notification.
pub struct Pipeline {
    storage: Arc<dyn JobStorage>,
    engine: StructuringEngine,
    notifier: Arc<dyn Notifier>,
    paginator: Paginator,
    deduplicator: Deduplicator,
    item_delay: Duration,
}

impl Pipeline {
    pub fn new(
        storage: Arc<dyn JobStorage>,
        engine: StructuringEngine,
        notifier: Arc<dyn Notifier>,
        paginator: Paginator,
    ) -> Self {
        Self {
            storage,
            engine,
            notifier,
            paginator,
            deduplicator: Deduplicator::new(),
            item_delay: Duration::ZERO,
        }
    }

    /// Pause between items, easing load on the AI backend and notifier.
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    /// Wire up the production collaborators described by `config`.
    pub fn from_config(config: &Config, client: &reqwest::Client) -> Result<Self> {
        let backend = OpenAiClient::new(&config.ai, client.clone())?;
        Ok(Self::new(
            Arc::new(LocalStorage::new(&config.storage.root)),
            StructuringEngine::new(Arc::new(backend)),
            build_notifier(&config.notifier, client.clone()),
            Paginator::from_config(&config.crawler),
        )
        .with_item_delay(Duration::from_millis(config.crawler.item_delay_ms)))
    }

    /// Run every source in order. A failed source is logged and the rest
    /// still run.
    pub async fn run_all(
        &self,
        sources: &[Box<dyn SourceAdapter>],
    ) -> Vec<(String, Result<RunReport>)> {
        let mut results = Vec::with_capacity(sources.len());
        for source in sources {
            let result = self.run_source(source.as_ref()).await;
            if let Err(e) = &result {
                log::error!("[{}] run failed: {}", source.name(), e);
            }
            results.push((source.name().to_string(), result));
        }
        results
    }

    /// One full pass over a single source.
    pub async fn run_source(&self, source: &dyn SourceAdapter) -> Result<RunReport> {
        let name = source.name();
        let mut report = RunReport::started(name);
        log::info!("[{}] run starting", name);

        let listings = self.paginator.paginate(source).await.inspect_err(|e| {
            log::error!("[{}] pagination aborted: {}", name, e);
        })?;
        report.discovered = listings.len();

        let mut ledger = self.storage.load_ledger(name).await?;
        let dedup = self.deduplicator.find_new(&ledger, &listings);
        report.new_listings = dedup.new_listings.len();
        report.known = dedup.known;
        report.repeated = dedup.repeated;
        log::info!(
            "[{}] {} listings discovered, {} new, {} known, {} repeated",
            name,
            report.discovered,
            report.new_listings,
            report.known,
            report.repeated
        );

        if dedup.has_new() {
            ledger.append(&dedup.new_listings);
            self.storage.save_ledger(name, &ledger).await?;
        }

        for (i, listing) in dedup.new_listings.iter().enumerate() {
            if i > 0 && !self.item_delay.is_zero() {
                tokio::time::sleep(self.item_delay).await;
            }

            let record = match self.enrich(source, listing).await {
                Ok(record) => record,
                Err(e) => {
                    let kind = if e.is_transport() {
                        report.transport_failures += 1;
                        "transport"
                    } else {
                        "processing"
                    };
                    log::warn!(
                        "[{}] skipping '{}' after {} failure: {}",
                        name,
                        listing.identity,
                        kind,
                        e
                    );
                    report.failed += 1;
                    continue;
                }
            };
            report.persisted += 1;

            match self.notifier.send(&render_message(&record.summarized)).await {
                Ok(()) => report.notified += 1,
                Err(e) => {
                    log::warn!("[{}] notification for '{}' failed: {}", name, listing.identity, e);
                    report.notify_failures += 1;
                }
            }
        }

        report.end_time = Utc::now();
        log::info!(
            "[{}] run complete: {} persisted, {} failed, {} notified in {}s",
            name,
            report.persisted,
            report.failed,
            report.notified,
            report.duration_secs()
        );
        Ok(report)
    }

    /// Fetch, structure and persist one listing.
    async fn enrich(&self, source: &dyn SourceAdapter, listing: &RawListing) -> Result<EnrichedRecord> {
        let detail = source.fetch_detail(listing).await?;
        let input = source.enrichment_input(listing, &detail);

        let mut posting = self.engine.structure(&input, Utc::now()).await?;
        posting.url = source.posting_url(listing);

        let key = source.record_key(listing);
        if self.storage.record_exists(source.name(), &key).await? {
            return Err(AppError::validation(format!("record '{key}' already exists")));
        }

        let record = EnrichedRecord::new(source.record_content(listing, detail), posting);
        let location = self.storage.write_record(source.name(), &key, &record).await?;
        log::info!("[{}] stored {}", source.name(), location);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DetailDocument, IdentityLedger, ListingPage};
    use crate::services::CompletionBackend;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const POSTING: &str = r#"{
        "position": "Accountant",
        "company": "Acme",
        "remainingDays": "5",
        "gender": "female",
        "locations": "any",
        "summary": "Keeps the books.",
        "duration": "unspecified",
        "educationDegree": "bachelor",
        "educationFields": "Accounting, Finance",
        "experienceYears": 0,
        "englishRequired": "yes",
        "skillsRequired": ["Excel", "QuickBooks"],
        "skillsOptional": ["SQL", "Power BI"]
    }"#;

    struct FakeSource {
        ids: Vec<&'static str>,
        fail_pages: bool,
        failing_details: HashSet<&'static str>,
    }

    impl FakeSource {
        fn new(ids: Vec<&'static str>) -> Self {
            Self {
                ids,
                fail_pages: false,
                failing_details: HashSet::new(),
            }
        }
    }

    #[async_trait]
    impl SourceAdapter for FakeSource {
        fn name(&self) -> &str {
            "jobs"
        }

        async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
            if self.fail_pages {
                return Err(AppError::source_error("jobs", "timed out"));
            }
            let items = if page == 1 {
                self.ids.iter().map(|id| RawListing::new(*id, *id)).collect()
            } else {
                Vec::new()
            };
            Ok(ListingPage::new(items, Some(self.ids.len())))
        }

        async fn fetch_detail(&self, listing: &RawListing) -> Result<DetailDocument> {
            if self.failing_details.contains(listing.identity.as_str()) {
                // nothing listens on port 1, so this is a real connect error
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_secs(2))
                    .build()?;
                let body: serde_json::Value =
                    crate::utils::http::fetch_json(&client, "http://127.0.0.1:1/").await?;
                return DetailDocument::try_from(body);
            }
            let mut fields = serde_json::Map::new();
            fields.insert("slug".into(), json!(listing.identity));
            fields.insert("description".into(), json!("Bookkeeping role"));
            Ok(DetailDocument::new(fields))
        }

        fn record_key(&self, listing: &RawListing) -> String {
            listing.identity.clone()
        }

        fn posting_url(&self, listing: &RawListing) -> String {
            format!("https://jobs.example/jobs/{}", listing.identity)
        }
    }

    struct FencedBackend {
        answer: String,
    }

    impl FencedBackend {
        fn valid() -> Self {
            Self {
                answer: format!("```json\n{POSTING}\n```"),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for FencedBackend {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.answer.clone())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<()> {
            if self.fail {
                return Err(AppError::notify("chat not found"));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        _tmp: TempDir,
        storage: Arc<LocalStorage>,
        notifier: Arc<RecordingNotifier>,
        pipeline: Pipeline,
    }

    fn harness(backend: FencedBackend, notifier: RecordingNotifier) -> Harness {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        let notifier = Arc::new(notifier);
        let pipeline = Pipeline::new(
            storage.clone(),
            StructuringEngine::new(Arc::new(backend)),
            notifier.clone(),
            Paginator::new(20, Duration::ZERO),
        );
        Harness {
            _tmp: tmp,
            storage,
            notifier,
            pipeline,
        }
    }

    async fn seed_ledger(storage: &LocalStorage, ids: &[&str]) {
        let mut ledger = IdentityLedger::new();
        let items: Vec<RawListing> = ids.iter().map(|id| RawListing::new(*id, *id)).collect();
        ledger.append(&items);
        storage.save_ledger("jobs", &ledger).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_items_are_enriched_and_notified() {
        let h = harness(FencedBackend::valid(), RecordingNotifier::default());
        seed_ledger(&h.storage, &["A"]).await;

        let report = h
            .pipeline
            .run_source(&FakeSource::new(vec!["A", "B", "C"]))
            .await
            .unwrap();

        assert_eq!(report.discovered, 3);
        assert_eq!(report.new_listings, 2);
        assert_eq!(report.known, 1);
        assert_eq!(report.repeated, 0);
        assert_eq!(report.persisted, 2);
        assert_eq!(report.notified, 2);
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 2);

        let ledger = h.storage.load_ledger("jobs").await.unwrap();
        assert_eq!(ledger.len(), 3);
        assert!(["A", "B", "C"].iter().all(|id| ledger.contains(id)));

        assert!(!h.storage.record_exists("jobs", "A").await.unwrap());
        let record = h.storage.load_record("jobs", "B").await.unwrap().unwrap();
        assert_eq!(record.content["slug"], "B");
        assert_eq!(record.summarized.url, "https://jobs.example/jobs/B");
        assert_eq!(record.summarized.skills_optional, vec!["sql", "power_bi"]);
        assert!(h.storage.record_exists("jobs", "C").await.unwrap());
    }

    #[tokio::test]
    async fn test_detail_failure_is_isolated() {
        let h = harness(FencedBackend::valid(), RecordingNotifier::default());
        seed_ledger(&h.storage, &["A"]).await;

        let mut source = FakeSource::new(vec!["A", "B", "C"]);
        source.failing_details.insert("B");
        let report = h.pipeline.run_source(&source).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.transport_failures, 1);
        assert_eq!(report.persisted, 1);
        assert!(h.storage.load_ledger("jobs").await.unwrap().contains("B"));
        assert!(!h.storage.record_exists("jobs", "B").await.unwrap());
        assert!(h.storage.record_exists("jobs", "C").await.unwrap());

        let rerun = h.pipeline.run_source(&source).await.unwrap();
        assert_eq!(rerun.new_listings, 0);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let h = harness(FencedBackend::valid(), RecordingNotifier::default());
        let source = FakeSource::new(vec!["A", "B"]);

        let first = h.pipeline.run_source(&source).await.unwrap();
        assert_eq!(first.persisted, 2);

        let second = h.pipeline.run_source(&source).await.unwrap();
        assert_eq!(second.new_listings, 0);
        assert_eq!(second.persisted, 0);
        assert_eq!(h.notifier.sent.lock().unwrap().len(), 2);
        assert_eq!(h.storage.record_count("jobs").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_invalid_ai_output_skips_item() {
        let backend = FencedBackend {
            answer: r#"{"position": "Accountant"}"#.into(),
        };
        let h = harness(backend, RecordingNotifier::default());

        let report = h
            .pipeline
            .run_source(&FakeSource::new(vec!["A", "B"]))
            .await
            .unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.transport_failures, 0);
        assert_eq!(report.persisted, 0);
        assert_eq!(h.storage.load_ledger("jobs").await.unwrap().len(), 2);
        assert!(h.notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_keeps_records() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let h = harness(FencedBackend::valid(), notifier);

        let report = h
            .pipeline
            .run_source(&FakeSource::new(vec!["A", "B"]))
            .await
            .unwrap();

        assert_eq!(report.persisted, 2);
        assert_eq!(report.notified, 0);
        assert_eq!(report.notify_failures, 2);
        assert!(h.storage.record_exists("jobs", "A").await.unwrap());
    }

    #[tokio::test]
    async fn test_pagination_failure_leaves_ledger_untouched() {
        let h = harness(FencedBackend::valid(), RecordingNotifier::default());
        seed_ledger(&h.storage, &["A"]).await;

        let mut source = FakeSource::new(vec!["A", "B"]);
        source.fail_pages = true;
        assert!(h.pipeline.run_source(&source).await.is_err());

        let ledger = h.storage.load_ledger("jobs").await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(h.storage.record_count("jobs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_run_all_continues_after_failed_source() {
        let h = harness(FencedBackend::valid(), RecordingNotifier::default());

        let mut broken = FakeSource::new(vec!["X"]);
        broken.fail_pages = true;
        let sources: Vec<Box<dyn SourceAdapter>> =
            vec![Box::new(broken), Box::new(FakeSource::new(vec!["A"]))];

        let results = h.pipeline.run_all(&sources).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_err());
        assert_eq!(results[1].1.as_ref().unwrap().persisted, 1);
    }
}
