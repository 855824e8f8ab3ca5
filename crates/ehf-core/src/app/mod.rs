//! App - アプリケーション層
//!
//! ports を組み合わせてステータス解決のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **StatusResolver**: 1 件の解決（キャッシュ → 通信 → フェイルセーフ）
//! - **WorkerPool**: 同時実行数に上限のあるタスク実行
//! - **BatchResolver**: 一括リクエストによる解決
//! - **StatusUpdater**: 上記を組み合わせて StatusBoard を更新

pub mod batch;
pub mod pool;
pub mod resolver;
pub mod updater;

pub use self::batch::{BatchResolver, BatchRun, MissingPolicy};
pub use self::pool::{Completion, PoolError, PoolReport, PoolRun, TaskFailure, WorkerPool};
pub use self::resolver::{Origin, Resolution, StatusResolver};
pub use self::updater::{StatusUpdater, UpdateMode, UpdateReport};
