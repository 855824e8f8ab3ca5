//! StatusUpdater - ページ上の全ステータス要素を更新する
//!
//! # フロー
//! 1. 全要素をスピナー表示にする
//! 2. キャッシュ済みの id は即座に解決（同期パス）
//! 3. 残りを UpdateMode に従って解決
//!    - Individual: WorkerPool で最大 `limit` 件ずつ個別リクエスト
//!    - Batch: BatchResolver で 1 回の一括リクエスト
//! 4. 結果を描画命令に変換して StatusBoard に適用

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::batch::{BatchResolver, MissingPolicy};
use super::pool::{PoolError, PoolReport, WorkerPool};
use super::resolver::{Resolution, StatusResolver};
use crate::cache::SessionCache;
use crate::domain::{EntityId, RenderInstruction, StatusBoard, render};
use crate::ports::StatusSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum UpdateMode {
    Individual { limit: usize },
    Batch { missing: MissingPolicy },
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub resolutions: BTreeMap<EntityId, Resolution>,
    /// Everything applied to the board, in order (spinners first).
    pub instructions: Vec<RenderInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolReport>,
}

enum Strategy {
    Individual(WorkerPool),
    Batch(BatchResolver),
}

pub struct StatusUpdater {
    resolver: StatusResolver,
    strategy: Strategy,
}

impl StatusUpdater {
    pub fn new(
        source: Arc<dyn StatusSource>,
        cache: SessionCache,
        mode: UpdateMode,
    ) -> Result<Self, PoolError> {
        let strategy = match mode {
            UpdateMode::Individual { limit } => Strategy::Individual(WorkerPool::new(limit)?),
            UpdateMode::Batch { missing } => Strategy::Batch(BatchResolver::new(
                Arc::clone(&source),
                cache.clone(),
                missing,
            )),
        };
        Ok(Self {
            resolver: StatusResolver::new(source, cache),
            strategy,
        })
    }

    pub fn resolver(&self) -> &StatusResolver {
        &self.resolver
    }

    /// Resolves every element on `board` and renders the result onto it.
    pub async fn update(&self, board: &mut StatusBoard) -> UpdateReport {
        let ids = board.entity_ids();
        let mut instructions: Vec<RenderInstruction> = ids
            .iter()
            .cloned()
            .map(RenderInstruction::in_flight)
            .collect();
        board.apply_all(&instructions);

        let (resolutions, pool) = self.resolve_ids(&ids).await;

        let ordered = ids
            .iter()
            .filter_map(|id| resolutions.get(id).map(|r| (id, &r.status)));
        let settled = render(ordered);
        board.apply_all(&settled);
        instructions.extend(settled);

        UpdateReport {
            resolutions,
            instructions,
            pool,
        }
    }

    /// Resolves `ids` without touching any board.
    pub async fn resolve_ids(
        &self,
        ids: &[EntityId],
    ) -> (BTreeMap<EntityId, Resolution>, Option<PoolReport>) {
        match &self.strategy {
            Strategy::Batch(batch) => (batch.resolve_all(ids).await.resolutions, None),
            Strategy::Individual(pool) => {
                let mut resolutions = BTreeMap::new();
                let mut pending = Vec::new();
                for id in ids {
                    if resolutions.contains_key(id) || pending.contains(id) {
                        continue;
                    }
                    match self.resolver.cached(id) {
                        Some(hit) => {
                            resolutions.insert(id.clone(), hit);
                        }
                        None => pending.push(id.clone()),
                    }
                }

                let resolver = self.resolver.clone();
                let run = pool
                    .run(pending, move |id: EntityId| {
                        let resolver = resolver.clone();
                        async move { Ok::<_, Infallible>(resolver.resolve(&id).await) }
                    })
                    .await;

                for completion in run.completions {
                    let resolution = completion.result.unwrap_or_else(|failure| {
                        warn!(id = %completion.item, %failure, "lookup task did not finish");
                        Resolution::failed()
                    });
                    resolutions.insert(completion.item, resolution);
                }
                info!(
                    resolved = resolutions.len(),
                    failed = run.report.failed,
                    peak_in_flight = run.report.peak_in_flight,
                    "individual status lookups finished"
                );
                (resolutions, Some(run.report))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::resolver::Origin;
    use crate::domain::{IN_FLIGHT_CLASS, RenderState, Status};
    use crate::testing::{ScriptedSource, id, ids};
    use std::time::Duration;

    fn board(values: &[&str]) -> StatusBoard {
        StatusBoard::from_ids(ids(values))
    }

    #[tokio::test]
    async fn one_failure_in_five_only_rejects_that_entity() {
        let source = Arc::new(
            ScriptedSource::new()
                .with_flag("1", true)
                .with_flag("2", false)
                .failing("3")
                .with_flag("4", true)
                .with_flag("5", true)
                .with_delay(Duration::from_millis(5)),
        );
        let updater = StatusUpdater::new(
            source.clone(),
            SessionCache::in_memory(),
            UpdateMode::Individual { limit: 2 },
        )
        .unwrap();
        let mut board = board(&["1", "2", "3", "4", "5"]);

        let report = updater.update(&mut board).await;

        assert_eq!(board.status_of(&id("1")), Status::Confirmed);
        assert_eq!(board.status_of(&id("2")), Status::Rejected);
        assert_eq!(board.status_of(&id("3")), Status::Rejected);
        assert_eq!(board.status_of(&id("4")), Status::Confirmed);
        assert_eq!(board.status_of(&id("5")), Status::Confirmed);
        assert_eq!(report.resolutions[&id("3")].origin, Origin::Failed);
        assert_eq!(report.resolutions[&id("2")].origin, Origin::Network);
        assert!(source.peak_in_flight() <= 2);
        assert_eq!(report.pool.map(|p| p.launched), Some(5));

        // 失敗はキャッシュされない
        assert_eq!(updater.resolver().cached(&id("3")), None);
        assert!(updater.resolver().cached(&id("4")).is_some());
    }

    #[tokio::test]
    async fn spinners_come_first_then_settled_states() {
        let source = Arc::new(ScriptedSource::new().with_flag("A", true));
        let updater = StatusUpdater::new(
            source,
            SessionCache::in_memory(),
            UpdateMode::Individual { limit: 1 },
        )
        .unwrap();
        let mut board = board(&["A"]);

        let report = updater.update(&mut board).await;
        assert_eq!(report.instructions.len(), 2);
        assert_eq!(report.instructions[0].state, RenderState::InFlight);
        assert_eq!(
            report.instructions[1].state,
            RenderState::Settled(Status::Confirmed)
        );
        assert!(!board.elements()[0].has_class(IN_FLIGHT_CLASS));
        assert_eq!(board.elements()[0].content(), "✅");
    }

    #[tokio::test]
    async fn second_session_pass_uses_cache() {
        let source = Arc::new(ScriptedSource::new().with_flag("A", true).with_flag("B", false));
        let cache = SessionCache::in_memory();
        let updater = StatusUpdater::new(
            source.clone(),
            cache,
            UpdateMode::Individual { limit: 4 },
        )
        .unwrap();

        updater.update(&mut board(&["A", "B"])).await;
        assert_eq!(source.calls(), 2);

        let mut again = board(&["A", "B", "A"]);
        let report = updater.update(&mut again).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(report.pool.map(|p| p.launched), Some(0));
        assert!(report.resolutions.values().all(|r| r.origin == Origin::Cache));
        assert_eq!(again.elements()[2].content(), "✅");
    }

    #[tokio::test]
    async fn batch_mode_sends_one_request() {
        let source = Arc::new(ScriptedSource::new().with_bulk(&[("A", true), ("B", false)]));
        let updater = StatusUpdater::new(
            source.clone(),
            SessionCache::in_memory(),
            UpdateMode::Batch {
                missing: MissingPolicy::LeavePending,
            },
        )
        .unwrap();
        let mut board = board(&["A", "B", "C"]);

        let report = updater.update(&mut board).await;
        assert_eq!(source.bulk_calls(), 1);
        assert_eq!(source.calls(), 0);
        assert!(report.pool.is_none());
        assert_eq!(board.status_of(&id("A")), Status::Confirmed);
        assert_eq!(board.status_of(&id("B")), Status::Rejected);
        assert_eq!(board.status_of(&id("C")), Status::Pending);
        assert!(board.elements()[2].has_class("gul"));
    }

    #[test]
    fn zero_limit_fails_construction() {
        let result = StatusUpdater::new(
            Arc::new(ScriptedSource::new()),
            SessionCache::in_memory(),
            UpdateMode::Individual { limit: 0 },
        );
        assert!(matches!(result, Err(PoolError::ZeroConcurrency)));
    }

    #[test]
    fn mode_serializes_with_tag() {
        let v = serde_json::to_value(UpdateMode::Individual { limit: 3 }).unwrap();
        assert_eq!(v["mode"], "individual");
        assert_eq!(v["limit"], 3);
    }
}
