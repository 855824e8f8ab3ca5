//! StatusResolver - 1 エンティティのステータス解決
//!
//! # フロー
//! 1. SessionCache を確認（ヒットすれば通信なし・同期パス）
//! 2. StatusSource に問い合わせ
//! 3. 成功: フラグ → Status、キャッシュに保存
//! 4. 失敗: Rejected（ログのみ、キャッシュしない）

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::SessionCache;
use crate::domain::{EntityId, Status};
use crate::ports::StatusSource;

/// Where a resolved status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Cache,
    Network,
    /// The lookup failed; the status is the fail-safe `Rejected`.
    Failed,
    /// A batch response did not mention the id.
    Omitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub status: Status,
    pub origin: Origin,
}

impl Resolution {
    pub fn new(status: Status, origin: Origin) -> Self {
        Self { status, origin }
    }

    pub fn failed() -> Self {
        Self::new(Status::Rejected, Origin::Failed)
    }
}

#[derive(Clone)]
pub struct StatusResolver {
    source: Arc<dyn StatusSource>,
    cache: SessionCache,
}

impl StatusResolver {
    pub fn new(source: Arc<dyn StatusSource>, cache: SessionCache) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &Arc<dyn StatusSource> {
        &self.source
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Synchronous path: the cached status, if any.
    pub fn cached(&self, id: &EntityId) -> Option<Resolution> {
        self.cache
            .get(id)
            .map(|status| Resolution::new(status, Origin::Cache))
    }

    /// Resolves one entity. Never fails: lookup errors become `Rejected`.
    pub async fn resolve(&self, id: &EntityId) -> Resolution {
        if let Some(hit) = self.cached(id) {
            debug!(%id, status = %hit.status, "cache hit");
            return hit;
        }

        match self.source.fetch_status(id).await {
            Ok(flag) => {
                let status = Status::from_flag(flag);
                self.cache.put(id, status);
                Resolution::new(status, Origin::Network)
            }
            Err(err) => {
                warn!(%id, error = %err, "status lookup failed");
                Resolution::failed()
            }
        }
    }
}
