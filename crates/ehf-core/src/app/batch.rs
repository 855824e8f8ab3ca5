//! BatchResolver - 一括リクエストによるステータス解決
//!
//! キャッシュ済みの id は問い合わせず、残りを 1 回のリクエストにまとめます。
//! レスポンスに含まれない id の扱いは `MissingPolicy` で明示的に選ぶ。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::resolver::{Origin, Resolution};
use crate::cache::SessionCache;
use crate::domain::{EntityId, Status};
use crate::ports::StatusSource;

/// What to show for an id the batch response does not mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    #[default]
    LeavePending,
    Reject,
}

impl MissingPolicy {
    pub fn status(self) -> Status {
        match self {
            MissingPolicy::LeavePending => Status::Pending,
            MissingPolicy::Reject => Status::Rejected,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchRun {
    pub resolutions: BTreeMap<EntityId, Resolution>,
    /// Ids carried by the request, in request order. Empty when nothing was sent.
    pub queried: Vec<EntityId>,
}

#[derive(Clone)]
pub struct BatchResolver {
    source: Arc<dyn StatusSource>,
    cache: SessionCache,
    policy: MissingPolicy,
}

impl BatchResolver {
    pub fn new(source: Arc<dyn StatusSource>, cache: SessionCache, policy: MissingPolicy) -> Self {
        Self {
            source,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> MissingPolicy {
        self.policy
    }

    pub async fn resolve_all(&self, ids: &[EntityId]) -> BatchRun {
        let mut resolutions = BTreeMap::new();
        let mut seen = BTreeSet::new();
        let mut queried = Vec::new();

        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            match self.cache.get(id) {
                Some(status) => {
                    resolutions.insert(id.clone(), Resolution::new(status, Origin::Cache));
                }
                None => queried.push(id.clone()),
            }
        }

        if queried.is_empty() {
            debug!(cached = resolutions.len(), "every id was cached; no batch request");
            return BatchRun {
                resolutions,
                queried,
            };
        }

        match self.source.fetch_bulk(&queried).await {
            Ok(flags) => {
                let mut omitted = 0usize;
                for id in &queried {
                    let resolution = match flags.get(id) {
                        Some(&flag) => {
                            let status = Status::from_flag(flag);
                            self.cache.put(id, status);
                            Resolution::new(status, Origin::Network)
                        }
                        None => {
                            omitted += 1;
                            Resolution::new(self.policy.status(), Origin::Omitted)
                        }
                    };
                    resolutions.insert(id.clone(), resolution);
                }
                let unexpected = flags.keys().filter(|k| !seen.contains(k)).count();
                if unexpected > 0 {
                    debug!(unexpected, "ignoring ids that were not queried");
                }
                info!(
                    queried = queried.len(),
                    omitted,
                    policy = ?self.policy,
                    "batch status lookup finished"
                );
            }
            Err(err) => {
                warn!(queried = queried.len(), error = %err, "batch status lookup failed");
                for id in &queried {
                    resolutions.insert(id.clone(), Resolution::failed());
                }
            }
        }

        BatchRun {
            resolutions,
            queried,
        }
    }
}
