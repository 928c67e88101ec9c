// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the lead relay.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file). Provider credentials and sender identities are required; everything
//! else has a default.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub throttle: ThrottleConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Per-client admission throttling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Seconds needed to replenish one permit (default: 60)
    #[serde(default = "default_throttle_ttl")]
    pub ttl_secs: u64,

    /// Bucket capacity, i.e. the burst a fresh client gets (default: 10)
    #[serde(default = "default_throttle_limit")]
    pub limit: u32,

    /// Idle time after which a client's bucket is dropped (default: 300, and
    /// never shorter than `ttl_secs`)
    #[serde(default = "default_idle_secs")]
    pub idle_secs: u64,

    /// How often idle buckets are swept (default: 60)
    #[serde(default = "default_sweep_secs")]
    pub sweep_secs: u64,
}

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Origins allowed by CORS
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Maximum accepted request body (default: 25 MiB)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Key clients by X-Forwarded-For / X-Real-IP instead of the peer address
    #[serde(default)]
    pub trust_proxy_headers: bool,

    /// Upper bound for draining in-flight requests on shutdown (default: 5)
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SurrealDB endpoint (default: mem://)
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_database_name")]
    pub name: String,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// JSON file of clients upserted at startup
    #[serde(default)]
    pub clients_file: Option<PathBuf>,
}

/// Messaging provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// `endpoint=<url>;accesskey=<key>`
    #[serde(default)]
    pub connection_string: String,

    /// Sender email address
    #[serde(default)]
    pub email_from: String,

    /// Sender phone number
    #[serde(default)]
    pub sms_from: String,

    /// Upper bound for a single provider call (default: 10)
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_throttle_ttl() -> u64 {
    60
}

fn default_throttle_limit() -> u32 {
    10
}

fn default_idle_secs() -> u64 {
    300
}

fn default_sweep_secs() -> u64 {
    60
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_shutdown_timeout() -> u64 {
    5
}

fn default_database_url() -> String {
    "mem://".to_string()
}

fn default_namespace() -> String {
    "relay".to_string()
}

fn default_database_name() -> String {
    "leads".to_string()
}

fn default_provider_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            throttle: ThrottleConfig::default(),
            http: HttpConfig::default(),
            database: DatabaseConfig::default(),
            provider: ProviderConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_throttle_ttl(),
            limit: default_throttle_limit(),
            idle_secs: default_idle_secs(),
            sweep_secs: default_sweep_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_body_bytes: default_max_body_bytes(),
            trust_proxy_headers: false,
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            namespace: default_namespace(),
            name: default_database_name(),
            user: None,
            password: None,
            clients_file: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            email_from: String::new(),
            sms_from: String::new(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl ThrottleConfig {
    /// Time needed to replenish one permit.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Idle window after which a bucket is evicted.
    pub fn idle_horizon(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_secs.max(1))
    }
}

impl HttpConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ttl_secs = parse_or(&get, "THROTTLE_TTL", default_throttle_ttl())?;
        let throttle = ThrottleConfig {
            ttl_secs,
            limit: parse_or(&get, "THROTTLE_LIMIT", default_throttle_limit())?,
            idle_secs: parse_or(&get, "THROTTLE_IDLE_SECS", default_idle_secs().max(ttl_secs))?,
            sweep_secs: parse_or(&get, "THROTTLE_SWEEP_SECS", default_sweep_secs())?,
        };
        if throttle.ttl_secs == 0 {
            return Err(invalid("THROTTLE_TTL", "0"));
        }
        if throttle.limit == 0 {
            return Err(invalid("THROTTLE_LIMIT", "0"));
        }
        // An evicted bucket comes back full, so a horizon shorter than one
        // refill would hand out permits faster than the configured rate.
        if throttle.idle_secs < throttle.ttl_secs {
            return Err(invalid(
                "THROTTLE_IDLE_SECS",
                &throttle.idle_secs.to_string(),
            ));
        }

        let http = HttpConfig {
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            max_body_bytes: parse_or(&get, "MAX_BODY_BYTES", default_max_body_bytes())?,
            trust_proxy_headers: parse_or(&get, "TRUST_PROXY_HEADERS", false)?,
            shutdown_timeout_secs: parse_or(
                &get,
                "SHUTDOWN_TIMEOUT_SECS",
                default_shutdown_timeout(),
            )?,
        };

        let database = DatabaseConfig {
            url: get("DATABASE_URL").unwrap_or_else(default_database_url),
            namespace: get("DATABASE_NAMESPACE").unwrap_or_else(default_namespace),
            name: get("DATABASE_NAME").unwrap_or_else(default_database_name),
            user: get("DATABASE_USER"),
            password: get("DATABASE_PASSWORD"),
            clients_file: get("CLIENTS_FILE").map(PathBuf::from),
        };

        let provider = ProviderConfig {
            connection_string: get("AZURE_URL").ok_or(ConfigError::Missing("AZURE_URL"))?,
            email_from: get("EMAIL_FROM").ok_or(ConfigError::Missing("EMAIL_FROM"))?,
            sms_from: get("SMS_FROM").ok_or(ConfigError::Missing("SMS_FROM"))?,
            timeout_secs: parse_or(&get, "PROVIDER_TIMEOUT_SECS", default_provider_timeout())?,
        };
        if provider.timeout_secs == 0 {
            return Err(invalid("PROVIDER_TIMEOUT_SECS", "0"));
        }

        let metrics = MetricsConfig {
            enabled: parse_or(&get, "METRICS_ENABLED", default_true())?,
            ..Default::default()
        };

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(default_bind_addr),
            throttle,
            http,
            database,
            provider,
            metrics,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(key, &raw)),
        None => Ok(default),
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}
