//! # parcelbase-config
//!
//! Layered application configuration: defaults, then an optional TOML file,
//! then `PARCELBASE_*` environment variables.
//!
//! # Example (TOML)
//!
//! ```toml
//! [backend]
//! url = "https://project.backend.example.com"
//! api_key = "publishable-key"
//!
//! [fetch]
//! timeout = "8s"
//! retries = 2
//!
//! [cache]
//! packages_ttl = "3m"
//!
//! [session]
//! fallback_role = "viewer"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use parcelbase_core::{CoreError, Result, Role};

/// Root application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend connection.
    pub backend: BackendConfig,

    /// Timeout/retry knobs for data fetches.
    pub fetch: FetchConfig,

    /// Cache TTLs.
    pub cache: CacheConfig,

    /// Session state machine knobs.
    pub session: SessionConfig,
}

/// Connection to the external backend platform.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend project.
    pub url: String,

    /// Publishable API key sent with every request.
    pub api_key: String,

    /// Run against seeded in-memory data instead of the real backend.
    pub demo_mode: bool,
}

impl BackendConfig {
    /// Whether enough is present to reach a real backend.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty() && !self.api_key.is_empty()
    }
}

/// Timeout/retry configuration for data fetches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Deadline for a single fetch attempt.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Retries after the first failed attempt.
    pub retries: u32,

    /// Package list views retry harder; they are the landing page.
    pub list_retries: u32,

    /// First retry delay; grows linearly per attempt.
    #[serde(with = "humantime_serde")]
    pub base_delay: Duration,

    /// Deadline for the connection health probe.
    #[serde(with = "humantime_serde")]
    pub connection_check_timeout: Duration,

    /// Client-level cap on any single HTTP request.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            retries: 2,
            list_retries: 3,
            base_delay: Duration::from_secs(1),
            connection_check_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Cache TTL configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for entries without a more specific setting.
    #[serde(with = "humantime_serde")]
    pub default_ttl: Duration,

    /// TTL for package list views, which change most often.
    #[serde(with = "humantime_serde")]
    pub packages_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(5 * 60),
            packages_ttl: Duration::from_secs(3 * 60),
        }
    }
}

/// Session state machine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Deadline for one profile lookup.
    #[serde(with = "humantime_serde")]
    pub profile_timeout: Duration,

    /// Role granted when a profile cannot be resolved.
    pub fallback_role: Role,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile_timeout: Duration::from_millis(1500),
            fallback_role: Role::fallback(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then `file` (if given), then
    /// `PARCELBASE_*` environment variables (`__` as section separator,
    /// e.g. `PARCELBASE_BACKEND__URL`).
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the file or an override fails to parse.
    pub fn load(file: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(config::File::with_name(file));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("PARCELBASE").separator("__"),
        );
        builder
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| CoreError::configuration(e.to_string()))
    }

    /// Parse configuration from a TOML string, over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the TOML fails to parse.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| CoreError::configuration(e.to_string()))
    }
}
