//! Explorer configuration
//!
//! Service root and HTTP settings, loaded from YAML and overridden from the
//! command line. Precedence: CLI flag > environment > file > defaults (the
//! environment is read by clap alongside the flags).

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Service the original walkthroughs query
pub const DEFAULT_SERVICE_URL: &str = "https://arctic-sta.gswlab.ca/FROST-Server/v1.0";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete explorer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExplorerConfig {
    /// Service root, e.g. `https://host/FROST-Server/v1.0`
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            http: HttpSettings::default(),
        }
    }
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

// ============================================================================
// HTTP Settings
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff between retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// Initial backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Backoff ceiling in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Client-side rate limit; unlimited when absent
    #[serde(default)]
    pub requests_per_second: Option<u32>,

    /// User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            requests_per_second: None,
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

// ============================================================================
// Overrides
// ============================================================================

/// Values supplied on the command line (or through the environment)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub service_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub requests_per_second: Option<u32>,
}

// ============================================================================
// Loading
// ============================================================================

impl ExplorerConfig {
    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

        debug!("Loaded config from {}", path.display());
        Self::from_yaml_str(&content)
    }

    /// Parse a configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty file means "all defaults"
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.service_url = normalize_service_url(&config.service_url)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise, then apply overrides
    pub fn resolve(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(overrides)?;
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(url) = &overrides.service_url {
            self.service_url = normalize_service_url(url)?;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.http.timeout_secs = timeout;
        }
        if let Some(retries) = overrides.max_retries {
            self.http.max_retries = retries;
        }
        if let Some(rps) = overrides.requests_per_second {
            self.http.requests_per_second = Some(rps);
        }
        self.validate()
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(Error::InvalidConfigValue {
                field: "http.timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.http.initial_backoff_ms > self.http.max_backoff_ms {
            return Err(Error::InvalidConfigValue {
                field: "http.initial_backoff_ms".to_string(),
                message: format!(
                    "{} exceeds max_backoff_ms {}",
                    self.http.initial_backoff_ms, self.http.max_backoff_ms
                ),
            });
        }
        if self.http.requests_per_second == Some(0) {
            return Err(Error::InvalidConfigValue {
                field: "http.requests_per_second".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Build the HTTP client configuration
    pub fn http_client_config(&self) -> HttpClientConfig {
        let http = &self.http;
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .max_retries(http.max_retries)
            .backoff(
                http.backoff,
                Duration::from_millis(http.initial_backoff_ms),
                Duration::from_millis(http.max_backoff_ms),
            );

        builder = match http.requests_per_second {
            Some(rps) => builder.rate_limit(RateLimiterConfig::per_second(rps)),
            None => builder.no_rate_limit(),
        };

        if let Some(agent) = &http.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        builder.build()
    }
}

/// Check that `url` is an absolute http(s) URL and drop any trailing slash
fn normalize_service_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed)?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::InvalidConfigValue {
            field: "service_url".to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    Ok(trimmed.to_string())
}
