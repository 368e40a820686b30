//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CLIPPINGS_*)
//! 2. TOML config file (if CLIPPINGS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Default user agent: a realistic desktop Chrome string. Several news CDNs
/// serve stripped-down or challenge pages to obvious bot agents.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CLIPPINGS_*)
/// 2. TOML config file (if CLIPPINGS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for HTTP requests.
    ///
    /// Set via CLIPPINGS_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via CLIPPINGS_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Lightweight HTTP request timeout in milliseconds.
    ///
    /// Set via CLIPPINGS_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Bounded wait for the rendered session's DOM-ready signal, in
    /// milliseconds. Timing out here is a warning, not a failure.
    #[serde(default = "default_dom_ready_timeout_ms")]
    pub dom_ready_timeout_ms: u64,

    /// Per-selector wait when probing for common article containers in the
    /// rendered session, in milliseconds.
    #[serde(default = "default_selector_wait_ms")]
    pub selector_wait_ms: u64,

    /// Fixed settle delay after readiness waits, letting client-side
    /// rendering finish, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Lower bound of the randomized inter-request pacing delay, in
    /// milliseconds.
    #[serde(default = "default_delay_min_ms")]
    pub delay_min_ms: u64,

    /// Upper bound of the randomized inter-request pacing delay, in
    /// milliseconds.
    #[serde(default = "default_delay_max_ms")]
    pub delay_max_ms: u64,

    /// Whether the rendered fallback (headless browser) is enabled.
    ///
    /// Set via CLIPPINGS_RENDER_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub render_enabled: bool,

    /// Directory where exported spreadsheets are written.
    ///
    /// Set via CLIPPINGS_OUTPUT_DIR environment variable.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_dom_ready_timeout_ms() -> u64 {
    10_000
}

fn default_selector_wait_ms() -> u64 {
    5_000
}

fn default_settle_ms() -> u64 {
    2_000
}

fn default_delay_min_ms() -> u64 {
    500
}

fn default_delay_max_ms() -> u64 {
    2_000
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./scraped_data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            dom_ready_timeout_ms: default_dom_ready_timeout_ms(),
            selector_wait_ms: default_selector_wait_ms(),
            settle_ms: default_settle_ms(),
            delay_min_ms: default_delay_min_ms(),
            delay_max_ms: default_delay_max_ms(),
            render_enabled: true,
            output_dir: default_output_dir(),
        }
    }
}

impl AppConfig {
    /// Lightweight fetch timeout as a Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Inter-request pacing bounds as Durations.
    pub fn delay_range(&self) -> (Duration, Duration) {
        (Duration::from_millis(self.delay_min_ms), Duration::from_millis(self.delay_max_ms))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CLIPPINGS_`
    /// 2. TOML file from `CLIPPINGS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("CLIPPINGS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("CLIPPINGS_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
