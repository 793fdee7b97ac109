//! Client configuration
//!
//! `ApiConfig` is read once at startup and handed to the HTTP client, which
//! can be reconfigured explicitly later on. `LifecycleSettings` carries the
//! timing policy of a discovery run.
//!
//! ## Environment
//! Loaded from a `.env` file (if present) and the process environment:
//! - `DISCOVERY_API_URL`: API base URL, default `http://localhost:8000/api`
//! - `DISCOVERY_ACCESS_TOKEN`: bearer token sent with every request
//! - `DISCOVERY_LANGUAGE`: `Accept-Language` value, default `ru`
//! - `DISCOVERY_TIMEOUT_MS`: per-request timeout, default 30000

use std::env;
use std::time::Duration;
use url::Url;

use crate::error::{DiscoveryError, DiscoveryResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_LANGUAGE: &str = "ru";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the dashboard backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
    pub access_token: Option<String>,
    pub language: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: &str) -> DiscoveryResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            access_token: None,
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read configuration from `.env` and the process environment
    pub fn from_env() -> DiscoveryResult<Self> {
        // A missing .env file is fine
        let _ = dotenv::dotenv();

        let base_url = env::var("DISCOVERY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&base_url)?;

        config.access_token = env::var("DISCOVERY_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        if let Ok(language) = env::var("DISCOVERY_LANGUAGE") {
            config.language = language;
        }

        if let Ok(raw) = env::var("DISCOVERY_TIMEOUT_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| DiscoveryError::Config {
                message: format!("DISCOVERY_TIMEOUT_MS must be a number of milliseconds, got '{raw}'"),
            })?;
            config.timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server root without the `/api` suffix, used by the admin endpoints
    pub fn server_base(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        base.strip_suffix("/api").unwrap_or(base).to_string()
    }

    /// Absolute URL of a REST API path
    pub fn api_url(&self, path: &str) -> String {
        join(self.base_url.as_str(), path)
    }

    /// Absolute URL of an admin path
    pub fn admin_url(&self, path: &str) -> String {
        join(&self.server_base(), path)
    }
}

fn parse_base_url(raw: &str) -> DiscoveryResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| DiscoveryError::Config {
        message: format!("invalid API base URL '{raw}': {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DiscoveryError::Config {
            message: format!("unsupported URL scheme '{other}' in '{raw}'"),
        }),
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Timing policy of a discovery run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// Delay between status fetches while a job runs
    pub poll_interval: Duration,
    /// Stop polling after this long without a terminal status, `None` polls until cancelled
    pub polling_ceiling: Option<Duration>,
    /// Pause between per-item requests of a sequential run
    pub item_delay: Duration,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3000),
            polling_ceiling: Some(Duration::from_secs(60)),
            item_delay: Duration::from_millis(1000),
        }
    }
}

impl LifecycleSettings {
    pub fn validate(&self) -> DiscoveryResult<()> {
        if self.poll_interval.is_zero() {
            return Err(DiscoveryError::Config {
                message: "poll interval must be greater than zero".to_string(),
            });
        }
        if let Some(ceiling) = self.polling_ceiling {
            if ceiling < self.poll_interval {
                return Err(DiscoveryError::Config {
                    message: format!(
                        "polling ceiling ({ceiling:?}) is shorter than the poll interval ({:?})",
                        self.poll_interval
                    ),
                });
            }
        }
        Ok(())
    }
}
