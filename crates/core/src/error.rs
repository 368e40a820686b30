//! Unified error types for clippings.
//!
//! The lightweight-fetch family (`Network`, `HttpStatus`, `FetchTimeout`,
//! `FetchTooLarge`) all trigger the rendered fallback. `Extraction` means
//! both strategies were exhausted for one URL; it is fatal to that URL only,
//! never to the batch.

/// Unified error type for the clippings pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty URL list).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be canonicalized.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure on the lightweight fetch.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Lightweight fetch returned a non-2xx status.
    #[error("HTTP_STATUS: {0}")]
    HttpStatus(u16),

    /// Lightweight fetch exceeded its deadline.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Response body exceeded the configured size cap.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Rendered session could not be launched or navigated.
    #[error("RENDER_FAILED: {0}")]
    RenderFailed(String),

    /// Rendered session readiness wait timed out and no HTML was produced.
    #[error("RENDER_TIMEOUT: {0}")]
    RenderTimeout(String),

    /// Both fetch strategies exhausted for one URL.
    #[error("EXTRACTION_FAILED: {url}: {cause}")]
    Extraction { url: String, cause: String },

    /// A batch run is already in progress.
    #[error("BATCH_BUSY: a batch run is already in progress")]
    BatchBusy,

    /// Configuration could not be loaded or failed validation.
    #[error("CONFIG_ERROR: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a fetch-stage failure as the per-URL terminal error.
    pub fn extraction(url: impl Into<String>, cause: &Error) -> Self {
        Error::Extraction { url: url.into(), cause: cause.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_codes() {
        let err = Error::HttpStatus(403);
        assert!(err.to_string().contains("HTTP_STATUS"));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_extraction_wraps_cause() {
        let cause = Error::Network("connection refused".into());
        let err = Error::extraction("https://example.com/a", &cause);
        let text = err.to_string();
        assert!(text.contains("EXTRACTION_FAILED"));
        assert!(text.contains("https://example.com/a"));
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_batch_busy_display() {
        assert!(Error::BatchBusy.to_string().contains("BATCH_BUSY"));
    }
}
