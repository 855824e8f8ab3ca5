//! Environment-driven configuration.

use std::env;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use crate::app::{MissingPolicy, UpdateMode};
use crate::impls::DEFAULT_BULK_PATH;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("EHF_BASE_URL must be an absolute http(s) url, got `{0}`")]
    InvalidBaseUrl(String),

    #[error("EHF_MODE must be `individual` or `batch`, got `{0}`")]
    InvalidMode(String),

    #[error("EHF_CONCURRENCY must be a positive integer, got `{0}`")]
    InvalidConcurrency(String),

    #[error("EHF_MISSING_POLICY must be `pending` or `rejected`, got `{0}`")]
    InvalidMissingPolicy(String),

    #[error("EHF_TIMEOUT_SECS must be a positive integer, got `{0}`")]
    InvalidTimeout(String),

    #[error("EHF_BULK_PATH must start with `/`, got `{0}`")]
    InvalidBulkPath(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    Individual,
    Batch,
}

/// Parses a backend base url. Only absolute http(s) urls that can carry a path are accepted.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    Url::parse(raw)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https") && !u.cannot_be_a_base())
        .ok_or_else(|| ConfigError::InvalidBaseUrl(raw.to_string()))
}

/// Where and how statuses are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub base_url: Url,
    pub bulk_path: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    pub mode: LookupMode,
    pub concurrency: usize,
    pub missing: MissingPolicy,
}

impl UpdaterConfig {
    pub fn update_mode(&self) -> UpdateMode {
        match self.mode {
            LookupMode::Individual => UpdateMode::Individual {
                limit: self.concurrency,
            },
            LookupMode::Batch => UpdateMode::Batch {
                missing: self.missing,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub updater: UpdaterConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let base_url = parse_base_url(&get("EHF_BASE_URL", DEFAULT_BASE_URL))?;

        let bulk_path = get("EHF_BULK_PATH", DEFAULT_BULK_PATH);
        if !bulk_path.starts_with('/') {
            return Err(ConfigError::InvalidBulkPath(bulk_path));
        }

        let raw_timeout = get("EHF_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string());
        let timeout = raw_timeout
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidTimeout(raw_timeout))?;

        let raw_mode = get("EHF_MODE", "individual");
        let mode = match raw_mode.to_ascii_lowercase().as_str() {
            "individual" | "single" => LookupMode::Individual,
            "batch" | "bulk" => LookupMode::Batch,
            _ => return Err(ConfigError::InvalidMode(raw_mode)),
        };

        let raw_concurrency = get("EHF_CONCURRENCY", &DEFAULT_CONCURRENCY.to_string());
        let concurrency = raw_concurrency
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidConcurrency(raw_concurrency))?;

        let raw_missing = get("EHF_MISSING_POLICY", "pending");
        let missing = match raw_missing.to_ascii_lowercase().as_str() {
            "pending" => MissingPolicy::LeavePending,
            "rejected" | "reject" => MissingPolicy::Reject,
            _ => return Err(ConfigError::InvalidMissingPolicy(raw_missing)),
        };

        Ok(Self {
            source: SourceConfig {
                base_url,
                bulk_path,
                timeout,
            },
            updater: UpdaterConfig {
                mode,
                concurrency,
                missing,
            },
            telemetry: TelemetryConfig {
                log_level: get("EHF_LOG_LEVEL", DEFAULT_LOG_LEVEL),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_env_missing() {
        let config = load(&[]).unwrap();
        assert_eq!(config.source.base_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.source.bulk_path, "/ehf-status-bulk");
        assert_eq!(config.source.timeout, Duration::from_secs(10));
        assert_eq!(config.updater.mode, LookupMode::Individual);
        assert_eq!(config.updater.concurrency, 4);
        assert_eq!(config.updater.missing, MissingPolicy::LeavePending);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(
            config.updater.update_mode(),
            UpdateMode::Individual { limit: 4 }
        );
    }

    #[test]
    fn batch_mode_with_reject_policy() {
        let config = load(&[
            ("EHF_MODE", "Batch"),
            ("EHF_MISSING_POLICY", "rejected"),
            ("EHF_BULK_PATH", "/ehf-status/bulk"),
        ])
        .unwrap();
        assert_eq!(
            config.updater.update_mode(),
            UpdateMode::Batch {
                missing: MissingPolicy::Reject
            }
        );
        assert_eq!(config.source.bulk_path, "/ehf-status/bulk");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("EHF_CONCURRENCY", "  "), ("EHF_LOG_LEVEL", "")]).unwrap();
        assert_eq!(config.updater.concurrency, 4);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[rstest]
    #[case::http("http://127.0.0.1:5000", true)]
    #[case::https_with_path(" https://ehf.example/api/ ", true)]
    #[case::no_scheme("localhost:5000", false)]
    #[case::mailto("mailto:post@example.no", false)]
    #[case::file("file:///tmp/x", false)]
    fn base_url_must_be_http(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(parse_base_url(raw).is_ok(), ok);
    }

    #[rstest]
    #[case::zero_concurrency("EHF_CONCURRENCY", "0", ConfigError::InvalidConcurrency("0".into()))]
    #[case::word_concurrency("EHF_CONCURRENCY", "many", ConfigError::InvalidConcurrency("many".into()))]
    #[case::mode("EHF_MODE", "parallel", ConfigError::InvalidMode("parallel".into()))]
    #[case::policy("EHF_MISSING_POLICY", "maybe", ConfigError::InvalidMissingPolicy("maybe".into()))]
    #[case::timeout("EHF_TIMEOUT_SECS", "0", ConfigError::InvalidTimeout("0".into()))]
    #[case::url("EHF_BASE_URL", "localhost:5000", ConfigError::InvalidBaseUrl("localhost:5000".into()))]
    #[case::ftp("EHF_BASE_URL", "ftp://host", ConfigError::InvalidBaseUrl("ftp://host".into()))]
    #[case::bulk_path("EHF_BULK_PATH", "bulk", ConfigError::InvalidBulkPath("bulk".into()))]
    fn invalid_values_are_reported(
        #[case] key: &str,
        #[case] value: &str,
        #[case] expected: ConfigError,
    ) {
        assert_eq!(load(&[(key, value)]).unwrap_err(), expected);
    }
}
