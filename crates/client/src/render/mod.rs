//! Rendered fetch strategy via a headless browser session.
//!
//! The session is process-wide per batch: lazily launched through a
//! [`SessionFactory`] on the first rendered fallback, shared by every URL in
//! the batch, and torn down exactly once at the end of the run.
//!
//! Readiness is best-effort: a bounded DOM-ready wait, then a probe over
//! common article-container selectors, then a fixed settle delay. A timeout
//! on the ready-signal wait is logged as a warning, not treated as fatal;
//! extraction proceeds on whatever DOM exists at that point.

use std::time::Duration;

use clippings_core::Error;
use url::Url;

use crate::extract::rules::CONTENT_READY_SELECTORS;

/// Timing knobs for rendered fetches.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Bounded wait for the DOM-ready signal (default: 10s).
    pub dom_ready_timeout: Duration,

    /// Bounded wait per article-container selector probe (default: 5s).
    pub selector_wait: Duration,

    /// Fixed settle delay after the readiness waits (default: 2s).
    pub settle: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dom_ready_timeout: Duration::from_millis(10_000),
            selector_wait: Duration::from_millis(5_000),
            settle: Duration::from_millis(2_000),
        }
    }
}

impl RenderOptions {
    /// Build render options from the application configuration.
    pub fn from_app_config(config: &clippings_core::AppConfig) -> Self {
        Self {
            dom_ready_timeout: Duration::from_millis(config.dom_ready_timeout_ms),
            selector_wait: Duration::from_millis(config.selector_wait_ms),
            settle: Duration::from_millis(config.settle_ms),
        }
    }
}

/// A live rendered-browser session.
///
/// At most one exists per batch run; it is never shared across threads
/// concurrently (batch processing is strictly sequential).
#[async_trait::async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate the session to the URL and return the rendered HTML.
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<String, Error>;

    /// Tear the session down. Called exactly once at the end of a batch.
    async fn close(&mut self) -> Result<(), Error>;
}

/// Launches rendered sessions on first need.
#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    /// Launch a new session.
    async fn launch(&self) -> Result<Box<dyn Renderer>, Error>;
}

/// Factory used when the rendered fallback is disabled by configuration or
/// compiled out; launching always fails, so lightweight-fetch failures
/// surface as per-URL extraction errors.
pub struct DisabledSessionFactory;

#[async_trait::async_trait]
impl SessionFactory for DisabledSessionFactory {
    async fn launch(&self) -> Result<Box<dyn Renderer>, Error> {
        Err(Error::RenderFailed("rendered fallback is disabled".into()))
    }
}

/// Headless Chrome/Chromium session using chromiumoxide.
#[cfg(feature = "render")]
pub struct HeadlessSession {
    browser: chromiumoxide::Browser,
}

#[cfg(feature = "render")]
impl HeadlessSession {
    /// Launch a headless browser instance.
    ///
    /// A background task drains Chrome DevTools Protocol events for the
    /// lifetime of the browser.
    pub async fn launch() -> Result<Self, Error> {
        use chromiumoxide::browser::{Browser, BrowserConfig};
        use futures_util::StreamExt;

        let (browser, mut handler) = Browser::launch(
            BrowserConfig::builder()
                .build()
                .map_err(Error::RenderFailed)?,
        )
        .await
        .map_err(|e| Error::RenderFailed(format!("browser launch failed: {}", e)))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        Ok(Self { browser })
    }
}

#[cfg(feature = "render")]
#[async_trait::async_trait]
impl Renderer for HeadlessSession {
    async fn render(&self, url: &Url, opts: &RenderOptions) -> Result<String, Error> {
        let start = std::time::Instant::now();

        let page = self
            .browser
            .new_page(url.as_str())
            .await
            .map_err(|e| Error::RenderFailed(format!("navigation failed: {}", e)))?;

        let mut dom_ready = true;
        match tokio::time::timeout(opts.dom_ready_timeout, page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                dom_ready = false;
                tracing::warn!("DOM-ready wait failed for {}: {}, proceeding with partial DOM", url, e);
            }
            Err(_) => {
                dom_ready = false;
                tracing::warn!("DOM-ready wait timed out for {}, proceeding with partial DOM", url);
            }
        }

        // Probe common article containers, short-circuiting on the first hit.
        // Misses are expected on non-article pages.
        'probe: for selector in CONTENT_READY_SELECTORS {
            let deadline = tokio::time::Instant::now() + opts.selector_wait;
            while tokio::time::Instant::now() < deadline {
                if page.find_element(*selector).await.is_ok() {
                    tracing::debug!("found content using selector: {}", selector);
                    break 'probe;
                }
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        }

        // Let client-side rendering finish.
        tokio::time::sleep(opts.settle).await;

        let html = page
            .content()
            .await
            .map_err(|e| Error::RenderFailed(format!("content retrieval failed: {}", e)))?;

        page.close().await.ok();

        if html.is_empty() {
            if !dom_ready {
                return Err(Error::RenderTimeout(format!("page at {} produced no HTML before timeout", url)));
            }
            return Err(Error::RenderFailed(format!("page at {} produced no HTML", url)));
        }

        tracing::debug!("rendered {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), html.len());

        Ok(html)
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.browser
            .close()
            .await
            .map_err(|e| Error::RenderFailed(format!("browser close failed: {}", e)))?;
        self.browser
            .wait()
            .await
            .map_err(|e| Error::RenderFailed(format!("browser shutdown failed: {}", e)))?;
        Ok(())
    }
}

/// Production factory launching one [`HeadlessSession`] per batch.
#[cfg(feature = "render")]
pub struct HeadlessSessionFactory;

#[cfg(feature = "render")]
#[async_trait::async_trait]
impl SessionFactory for HeadlessSessionFactory {
    async fn launch(&self) -> Result<Box<dyn Renderer>, Error> {
        Ok(Box::new(HeadlessSession::launch().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_options_default() {
        let opts = RenderOptions::default();
        assert_eq!(opts.dom_ready_timeout, Duration::from_millis(10_000));
        assert_eq!(opts.selector_wait, Duration::from_millis(5_000));
        assert_eq!(opts.settle, Duration::from_millis(2_000));
    }

    #[test]
    fn test_render_options_from_app_config() {
        let config = clippings_core::AppConfig { settle_ms: 100, ..Default::default() };
        let opts = RenderOptions::from_app_config(&config);
        assert_eq!(opts.settle, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_disabled_factory_fails_to_launch() {
        let factory = DisabledSessionFactory;
        let result = factory.launch().await;
        assert!(matches!(result, Err(Error::RenderFailed(_))));
    }

    #[cfg(feature = "render")]
    #[tokio::test]
    #[ignore = "requires Chrome/Chromium installation"]
    async fn test_headless_session_launch() {
        let session = HeadlessSession::launch().await;
        assert!(session.is_ok());
    }

    #[cfg(feature = "render")]
    #[tokio::test]
    #[ignore = "requires network and Chrome/Chromium"]
    async fn test_render_simple_page() {
        let mut session = HeadlessSession::launch().await.unwrap();
        let url = Url::parse("https://example.com").unwrap();

        let html = session.render(&url, &RenderOptions::default()).await.unwrap();
        assert!(html.contains("<html"));

        session.close().await.unwrap();
    }
}
