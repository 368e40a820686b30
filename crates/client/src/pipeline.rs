//! Two-tier extraction pipeline for a single URL.
//!
//! The lightweight HTTP fetch always goes first. Any failure there (network,
//! non-2xx status, timeout, oversized body) escalates to the rendered
//! strategy, lazily launching the shared browser session on first use. Only
//! when both strategies fail does the URL fail, and that failure never
//! propagates beyond the URL.

use chrono::Utc;
use url::Url;

use clippings_core::{ArticleRecord, Error};

use crate::extract::{self, ParsedDocument};
use crate::fetch::Fetch;
use crate::render::{RenderOptions, Renderer, SessionFactory};

/// Which fetch strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Plain HTTP fetch.
    Lightweight,
    /// Headless browser render.
    Rendered,
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Lightweight => write!(f, "lightweight fetch"),
            FetchStrategy::Rendered => write!(f, "rendered fetch"),
        }
    }
}

/// Extraction pipeline over injected fetch and session seams.
pub struct ExtractionPipeline<'a> {
    fetch: &'a dyn Fetch,
    sessions: &'a dyn SessionFactory,
    render_opts: RenderOptions,
}

impl<'a> ExtractionPipeline<'a> {
    pub fn new(fetch: &'a dyn Fetch, sessions: &'a dyn SessionFactory, render_opts: RenderOptions) -> Self {
        Self { fetch, sessions, render_opts }
    }

    /// Extract one URL into an [`ArticleRecord`].
    ///
    /// `session` is the batch-scoped browser session slot: `None` until the
    /// first rendered fallback, then reused for the rest of the batch. The
    /// caller observes the `None` to `Some` transition and owns teardown.
    pub async fn extract(
        &self,
        url: &Url,
        session: &mut Option<Box<dyn Renderer>>,
    ) -> Result<(ArticleRecord, FetchStrategy), Error> {
        // The parse tree is not Send, so the lightweight result must be
        // consumed before the rendered await for this future to stay
        // spawnable onto a worker task.
        let fetch_err = match self.lightweight(url).await {
            Ok(doc) => return Ok((build_record(url, &doc), FetchStrategy::Lightweight)),
            Err(e) => e,
        };
        tracing::info!("lightweight fetch of {} failed ({}), falling back to rendered fetch", url, fetch_err);

        match self.rendered(url, session).await {
            Ok(doc) => Ok((build_record(url, &doc), FetchStrategy::Rendered)),
            Err(render_err) => {
                tracing::warn!("rendered fetch of {} also failed: {}", url, render_err);
                Err(Error::extraction(url.as_str(), &render_err))
            }
        }
    }

    async fn lightweight(&self, url: &Url) -> Result<ParsedDocument, Error> {
        let response = self.fetch.fetch(url).await?;
        Ok(extract::normalize(&response.bytes, response.declared_charset()))
    }

    async fn rendered(&self, url: &Url, session: &mut Option<Box<dyn Renderer>>) -> Result<ParsedDocument, Error> {
        if session.is_none() {
            tracing::info!("launching browser session for rendered fallback");
            *session = Some(self.sessions.launch().await?);
        }
        let renderer = session
            .as_deref()
            .ok_or_else(|| Error::RenderFailed("render session unavailable".into()))?;

        // Rendered HTML comes back from the browser already decoded.
        let html = renderer.render(url, &self.render_opts).await?;
        Ok(extract::normalize(html.as_bytes(), Some("utf-8")))
    }
}

fn build_record(url: &Url, doc: &ParsedDocument) -> ArticleRecord {
    let title = extract::resolve_title(doc);
    let fallback_title = (title != extract::NO_TITLE).then_some(title.as_str());
    let headings = extract::collect_headings(doc, fallback_title);
    let body = extract::locate_content(doc);

    ArticleRecord { source_url: url.to_string(), title, headings, body, fetched_at: Utc::now() }
}
