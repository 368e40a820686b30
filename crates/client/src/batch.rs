//! Sequential batch orchestration.
//!
//! One batch runs at a time. URLs are processed strictly in input order
//! with a randomized pacing delay between them; per-URL failures are
//! recorded and skipped, never fatal to the run. Status events stream over
//! an unbounded channel so observers can lag without blocking the loop.
//!
//! The browser session is owned here: the pipeline launches it lazily into
//! a slot this loop holds, and the loop tears it down exactly once at its
//! single exit, whatever mix of successes and failures occurred.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::mpsc::UnboundedSender;

use clippings_core::{AppConfig, ArticleRecord, BatchProgress, Error};

use crate::fetch::{Fetch, canonicalize};
use crate::pipeline::ExtractionPipeline;
use crate::render::{RenderOptions, Renderer, SessionFactory};

/// A timestamped, human-readable status line emitted by a running batch.
#[derive(Debug, Clone)]
pub struct StatusEvent {
    /// When the event was emitted.
    pub at: DateTime<Utc>,
    /// Human-readable status line.
    pub message: String,
    /// Progress counters, when the event marks a per-URL step.
    pub progress: Option<BatchProgress>,
}

/// Sender half of the batch status stream.
pub type StatusSender = UnboundedSender<StatusEvent>;

/// Randomized inter-request pacing bounds.
///
/// A zero-width range (`min == max`) yields a fixed delay, which tests use
/// to keep runs deterministic.
#[derive(Debug, Clone, Copy)]
pub struct DelayPolicy {
    pub min: Duration,
    pub max: Duration,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self { min: Duration::from_millis(500), max: Duration::from_millis(2_000) }
    }
}

impl DelayPolicy {
    /// Fixed delay with no jitter.
    pub fn fixed(delay: Duration) -> Self {
        Self { min: delay, max: delay }
    }

    /// Build the pacing policy from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        let (min, max) = config.delay_range();
        Self { min, max }
    }

    /// Sample a delay uniformly from the configured bounds.
    pub fn sample(&self) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        let ms = rand::rng().random_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(ms)
    }
}

/// Result of a finished batch run.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Successfully extracted records, in input order.
    pub records: Vec<ArticleRecord>,
    /// Number of URLs that produced a record.
    pub succeeded: usize,
    /// Number of URLs that failed canonicalization or both fetch strategies.
    pub failed: usize,
}

/// Sequential batch runner over injected fetch and session seams.
pub struct BatchRunner {
    fetch: Box<dyn Fetch>,
    sessions: Box<dyn SessionFactory>,
    render_opts: RenderOptions,
    delay: DelayPolicy,
    running: AtomicBool,
}

impl BatchRunner {
    pub fn new(
        fetch: Box<dyn Fetch>,
        sessions: Box<dyn SessionFactory>,
        render_opts: RenderOptions,
        delay: DelayPolicy,
    ) -> Self {
        Self { fetch, sessions, render_opts, delay, running: AtomicBool::new(false) }
    }

    /// Run a batch over the given URLs, streaming status events to `status`.
    ///
    /// Fails fast with `InvalidInput` on an empty list and `BatchBusy` when
    /// a run is already in flight, both before any session work. Per-URL
    /// failures are counted in the outcome, not returned.
    pub async fn run(&self, urls: Vec<String>, status: StatusSender) -> Result<BatchOutcome, Error> {
        if urls.is_empty() {
            return Err(Error::InvalidInput("no URLs to scrape".into()));
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::BatchBusy);
        }

        let outcome = self.run_inner(urls, &status).await;
        self.running.store(false, Ordering::SeqCst);
        Ok(outcome)
    }

    async fn run_inner(&self, urls: Vec<String>, status: &StatusSender) -> BatchOutcome {
        let total = urls.len();
        let pipeline = ExtractionPipeline::new(self.fetch.as_ref(), self.sessions.as_ref(), self.render_opts.clone());

        emit(status, format!("Starting batch of {total} URLs"), Some(BatchProgress { completed: 0, total }));

        let mut session: Option<Box<dyn Renderer>> = None;
        let mut records = Vec::new();
        let mut failed = 0;

        for (i, raw) in urls.iter().enumerate() {
            let started = BatchProgress { completed: i, total };
            let done = BatchProgress { completed: i + 1, total };
            emit(status, format!("Scraping URL {}/{}: {}", i + 1, total, raw), Some(started));

            let url = match canonicalize(raw) {
                Ok(url) => url,
                Err(e) => {
                    emit(status, format!("Skipping invalid URL {raw}: {e}"), Some(done));
                    failed += 1;
                    continue;
                }
            };

            let had_session = session.is_some();
            let result = pipeline.extract(&url, &mut session).await;

            if !had_session && session.is_some() {
                emit(status, "Launched browser session for rendered fallback".to_string(), None);
            }

            match result {
                Ok((record, strategy)) => {
                    emit(status, format!("Scraped {url} via {strategy}"), Some(done));
                    records.push(record);
                }
                Err(e) => {
                    emit(status, format!("Failed to scrape {url}: {e}"), Some(done));
                    failed += 1;
                }
            }

            if i + 1 < total {
                tokio::time::sleep(self.delay.sample()).await;
            }
        }

        if let Some(mut live) = session.take() {
            emit(status, "Closing browser session".to_string(), None);
            if let Err(e) = live.close().await {
                tracing::warn!("browser session teardown failed: {}", e);
            }
        }

        let succeeded = records.len();
        emit(
            status,
            format!("Batch complete: {succeeded} succeeded, {failed} failed"),
            Some(BatchProgress { completed: total, total }),
        );

        BatchOutcome { records, succeeded, failed }
    }
}

/// Send a status event, ignoring a dropped receiver.
fn emit(status: &StatusSender, message: String, progress: Option<BatchProgress>) {
    status.send(StatusEvent { at: Utc::now(), message, progress }).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchResponse;
    use crate::render::DisabledSessionFactory;
    use bytes::Bytes;
    use reqwest::{StatusCode, Url};
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc;

    const PAGE: &str = r#"<html><head><title>Stubbed Page Title Here</title></head>
        <body><article><p>Stubbed page body with enough words to pass the filters.</p></article></body></html>"#;

    struct StubFetch {
        fail_path: Option<&'static str>,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl Fetch for StubFetch {
        async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
            tokio::time::sleep(self.delay).await;
            if self.fail_path.is_some_and(|p| url.path() == p) {
                return Err(Error::HttpStatus(404));
            }
            Ok(FetchResponse {
                url: url.clone(),
                final_url: url.clone(),
                status: StatusCode::OK,
                content_type: Some("text/html; charset=utf-8".to_string()),
                bytes: Bytes::from(PAGE),
                fetch_ms: 1,
            })
        }
    }

    struct CountingRenderer {
        closes: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl crate::render::Renderer for CountingRenderer {
        async fn render(&self, _url: &Url, _opts: &RenderOptions) -> Result<String, Error> {
            Ok(PAGE.to_string())
        }

        async fn close(&mut self) -> Result<(), Error> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CountingFactory {
        launches: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl SessionFactory for CountingFactory {
        async fn launch(&self) -> Result<Box<dyn crate::render::Renderer>, Error> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CountingRenderer { closes: Arc::clone(&self.closes) }))
        }
    }

    fn runner(fail_path: Option<&'static str>) -> BatchRunner {
        BatchRunner::new(
            Box::new(StubFetch { fail_path, delay: Duration::ZERO }),
            Box::new(DisabledSessionFactory),
            RenderOptions::default(),
            DelayPolicy::fixed(Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn test_empty_batch_rejected_before_any_work() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let err = runner(None).run(vec![], tx).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_records_in_input_order_with_midbatch_failure() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://example.com/missing".to_string(),
            "https://example.com/c".to_string(),
        ];

        let outcome = runner(Some("/missing")).run(urls, tx).await.unwrap();
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.records[0].source_url, "https://example.com/a");
        assert_eq!(outcome.records[1].source_url, "https://example.com/c");

        let mut messages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            messages.push(event.message);
        }
        assert!(messages[0].starts_with("Starting batch of 3"));
        assert!(messages.iter().any(|m| m.contains("Failed to scrape")));
        assert!(messages.last().is_some_and(|m| m.contains("2 succeeded, 1 failed")));
    }

    #[tokio::test]
    async fn test_post_url_progress_counts_finished_url() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let outcome = runner(None).run(vec!["https://example.com/a".to_string()], tx).await.unwrap();
        assert_eq!(outcome.succeeded, 1);

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        let started = events.iter().find(|e| e.message.starts_with("Scraping URL")).unwrap();
        assert_eq!(started.progress, Some(BatchProgress { completed: 0, total: 1 }));

        let scraped = events.iter().find(|e| e.message.starts_with("Scraped")).unwrap();
        assert_eq!(scraped.progress, Some(BatchProgress { completed: 1, total: 1 }));
    }

    #[tokio::test]
    async fn test_invalid_url_skipped() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let urls = vec!["   ".to_string(), "https://example.com/a".to_string()];

        let outcome = runner(None).run(urls, tx).await.unwrap();
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn test_session_launched_and_closed_once() {
        let launches = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));
        let runner = BatchRunner::new(
            Box::new(StubFetch { fail_path: Some("/blocked"), delay: Duration::ZERO }),
            Box::new(CountingFactory { launches: Arc::clone(&launches), closes: Arc::clone(&closes) }),
            RenderOptions::default(),
            DelayPolicy::fixed(Duration::ZERO),
        );

        let (tx, mut rx) = mpsc::unbounded_channel();
        let urls = vec!["https://a.example.com/blocked".to_string(), "https://b.example.com/blocked".to_string()];
        let outcome = runner.run(urls, tx).await.unwrap();

        assert_eq!(outcome.succeeded, 2);
        assert_eq!(launches.load(Ordering::SeqCst), 1);
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        let mut messages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            messages.push(event.message);
        }
        assert_eq!(messages.iter().filter(|m| m.contains("Launched browser")).count(), 1);
        assert_eq!(messages.iter().filter(|m| m.contains("Closing browser")).count(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_run_rejected() {
        let runner = Arc::new(BatchRunner::new(
            Box::new(StubFetch { fail_path: None, delay: Duration::from_millis(300) }),
            Box::new(DisabledSessionFactory),
            RenderOptions::default(),
            DelayPolicy::fixed(Duration::ZERO),
        ));

        let (tx, _rx) = mpsc::unbounded_channel();
        let first = {
            let runner = Arc::clone(&runner);
            let tx = tx.clone();
            tokio::spawn(async move { runner.run(vec!["https://example.com/a".to_string()], tx).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let err = runner.run(vec!["https://example.com/b".to_string()], tx).await.unwrap_err();
        assert!(matches!(err, Error::BatchBusy));

        assert!(first.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_runner_reusable_after_completion() {
        let runner = runner(None);
        for _ in 0..2 {
            let (tx, _rx) = mpsc::unbounded_channel();
            let outcome = runner.run(vec!["https://example.com/a".to_string()], tx).await.unwrap();
            assert_eq!(outcome.succeeded, 1);
        }
    }

    #[test]
    fn test_delay_policy_sample_within_bounds() {
        let policy = DelayPolicy { min: Duration::from_millis(10), max: Duration::from_millis(20) };
        for _ in 0..50 {
            let d = policy.sample();
            assert!(d >= policy.min && d <= policy.max);
        }
    }

    #[test]
    fn test_delay_policy_fixed_is_deterministic() {
        let policy = DelayPolicy::fixed(Duration::from_millis(7));
        assert_eq!(policy.sample(), Duration::from_millis(7));
    }
}
