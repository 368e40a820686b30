//! Lightweight HTTP fetch strategy.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Failure Semantics
//! - Any non-2xx status is a hard failure (`Error::HttpStatus`); the retry
//!   policy lives in the extraction pipeline, not here.
//! - Timeouts and transport failures map to `FetchTimeout` / `Network`.
//! - Max body bytes: 5MB (configurable).

pub mod url;

use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use url::{UrlError, canonicalize};

use clippings_core::Error;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string. Defaults to a realistic desktop Chrome string.
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 30s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(30000),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    /// Build a fetch config from the application configuration.
    pub fn from_app_config(config: &clippings_core::AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// Response from a lightweight fetch.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Charset declared in the Content-Type header, if any.
    pub fn declared_charset(&self) -> Option<&str> {
        let content_type = self.content_type.as_deref()?;
        let (_, after) = content_type.split_once("charset=")?;
        let charset = after
            .split(';')
            .next()
            .unwrap_or(after)
            .trim()
            .trim_matches('"');
        if charset.is_empty() { None } else { Some(charset) }
    }
}

/// Seam over the lightweight fetch strategy so the pipeline can be driven
/// with injected responses and failures in tests.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    /// Issue a GET for the URL, returning raw bytes and metadata.
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error>;
}

/// HTTP fetch client for the lightweight strategy.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Fetch for FetchClient {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let request = self
            .http
            .get(url.as_str())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Upgrade-Insecure-Requests", "1");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("request to {} timed out", url))
            } else {
                Error::Network(format!("network error: {}", e))
            }
        })?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        let content_length = response.content_length();
        if let Some(len) = content_length
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("reading body from {} timed out", url))
            } else {
                Error::Network(format!("failed to read response: {}", e))
            }
        })?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url: url.clone(), final_url, status, content_type, bytes, fetch_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert!(config.user_agent.contains("Chrome"));
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(30000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app_config() {
        let app = clippings_core::AppConfig { timeout_ms: 12_000, max_bytes: 1024, ..Default::default() };
        let config = FetchConfig::from_app_config(&app);
        assert_eq!(config.timeout, Duration::from_millis(12_000));
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.user_agent, app.user_agent);
    }

    #[test]
    fn test_declared_charset() {
        let response = FetchResponse {
            url: Url::parse("https://example.com").unwrap(),
            final_url: Url::parse("https://example.com").unwrap(),
            status: StatusCode::OK,
            content_type: Some("text/html; charset=ISO-8859-1".to_string()),
            bytes: Bytes::new(),
            fetch_ms: 0,
        };
        assert_eq!(response.declared_charset(), Some("ISO-8859-1"));
    }

    #[test]
    fn test_declared_charset_missing() {
        let response = FetchResponse {
            url: Url::parse("https://example.com").unwrap(),
            final_url: Url::parse("https://example.com").unwrap(),
            status: StatusCode::OK,
            content_type: Some("text/html".to_string()),
            bytes: Bytes::new(),
            fetch_ms: 0,
        };
        assert_eq!(response.declared_charset(), None);
    }

    #[test]
    fn test_declared_charset_quoted_with_params() {
        let response = FetchResponse {
            url: Url::parse("https://example.com").unwrap(),
            final_url: Url::parse("https://example.com").unwrap(),
            status: StatusCode::OK,
            content_type: Some("text/html; charset=\"utf-8\"; boundary=x".to_string()),
            bytes: Bytes::new(),
            fetch_ms: 0,
        };
        assert_eq!(response.declared_charset(), Some("utf-8"));
    }

    #[tokio::test]
    async fn test_fetch_client_new() {
        let config = FetchConfig::default();
        let client = FetchClient::new(config);
        assert!(client.is_ok());
    }
}
