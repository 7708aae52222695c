// src/pipeline/schedule.rs

//! Fixed-interval scheduling of pipeline passes.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::pipeline::{Pipeline, RunReport};
use crate::services::SourceAdapter;

/// Run all sources now and then every `interval` until Ctrl-C.
///
/// A pass in progress always finishes; shutdown is only observed between
/// passes.
pub async fn run_scheduled(
    pipeline: &Pipeline,
    sources: &[Box<dyn SourceAdapter>],
    interval: Duration,
) -> Result<usize> {
    run_until(pipeline, sources, interval, tokio::signal::ctrl_c()).await
}

/// Like [`run_scheduled`] with an arbitrary shutdown signal. Returns the
/// number of passes made.
pub async fn run_until<F>(
    pipeline: &Pipeline,
    sources: &[Box<dyn SourceAdapter>],
    interval: Duration,
    shutdown: F,
) -> Result<usize>
where
    F: Future<Output = std::io::Result<()>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut passes = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            signal = &mut shutdown => {
                signal?;
                log::info!("Shutdown requested after {} passes", passes);
                return Ok(passes);
            }
        }

        passes += 1;
        log::info!("Pass {} starting", passes);
        let results = pipeline.run_all(sources).await;
        log_pass_summary(&results);
        log::info!("Next pass in {}s", interval.as_secs());
    }
}

/// One line per source for a finished pass.
pub fn log_pass_summary(results: &[(String, Result<RunReport>)]) {
    for (source, result) in results {
        match result {
            Ok(r) => log::info!(
                "  {}: {} new, {} persisted, {} failed, {} notified",
                source,
                r.new_listings,
                r.persisted,
                r.failed,
                r.notified
            ),
            Err(e) => log::error!("  {}: failed: {}", source, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{DetailDocument, ListingPage, RawListing};
    use crate::pipeline::Paginator;
    use crate::services::{CompletionBackend, LogNotifier, StructuringEngine};
    use crate::storage::LocalStorage;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingSource {
        pages: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SourceAdapter for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_page(&self, _page: u32) -> Result<ListingPage> {
            self.pages.fetch_add(1, Ordering::SeqCst);
            Ok(ListingPage::default())
        }

        async fn fetch_detail(&self, _listing: &RawListing) -> Result<DetailDocument> {
            Err(AppError::source_error("counting", "unused"))
        }

        fn record_key(&self, listing: &RawListing) -> String {
            listing.identity.clone()
        }

        fn posting_url(&self, listing: &RawListing) -> String {
            listing.identity.clone()
        }
    }

    struct UnusedBackend;

    #[async_trait]
    impl CompletionBackend for UnusedBackend {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Err(AppError::ai("unused"))
        }
    }

    #[tokio::test]
    async fn test_first_pass_runs_immediately_then_stops() {
        let tmp = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(LocalStorage::new(tmp.path())),
            StructuringEngine::new(Arc::new(UnusedBackend)),
            Arc::new(LogNotifier),
            Paginator::new(5, Duration::ZERO),
        );
        let pages = Arc::new(AtomicUsize::new(0));
        let sources: Vec<Box<dyn SourceAdapter>> = vec![Box::new(CountingSource {
            pages: pages.clone(),
        })];

        let shutdown = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        };
        let passes = run_until(&pipeline, &sources, Duration::from_secs(3600), shutdown)
            .await
            .unwrap();

        assert_eq!(passes, 1);
        assert_eq!(pages.load(Ordering::SeqCst), 1);
    }
}
