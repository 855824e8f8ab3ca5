//! StatusSource port - リモートのステータス問い合わせ
//!
//! 個別問い合わせ（GET /ehf-status/{id}）と一括問い合わせ（POST /ehf-status-bulk）の
//! 二つの形を一つの trait で表現します。

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::EntityId;

/// Failure of a single remote lookup. Never fatal: callers map it to `Rejected`.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Remote source of confirmation flags.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Looks up one entity. `Ok(true)` means confirmed.
    async fn fetch_status(&self, id: &EntityId) -> Result<bool, SourceError>;

    /// Looks up many entities in exactly one request.
    ///
    /// The returned map may lack some of the queried ids, and may contain ids that
    /// were never asked for.
    async fn fetch_bulk(&self, ids: &[EntityId]) -> Result<HashMap<EntityId, bool>, SourceError>;
}
