use ehf_core::app::PoolError;
use ehf_core::config::ConfigError;
use ehf_core::domain::DomainError;
use ehf_core::ports::SourceError;
use ehf_core::table::SortError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error("invalid id: {0}")]
    Domain(#[from] DomainError),

    #[error("status source error: {0}")]
    Source(#[from] SourceError),

    #[error("scheduler error: {0}")]
    Pool(#[from] PoolError),

    #[error("sort error: {0}")]
    Sort(#[from] SortError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
