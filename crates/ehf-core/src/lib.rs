//! ehf-core
//!
//! Status lookups with a session cache and bounded concurrency, plus click-to-sort
//! for tables.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（EntityId, Status, 描画命令, StatusBoard）
//! - **ports**: 抽象化レイヤー（StatusSource, SessionStore, Clock）
//! - **impls**: 実装（HttpStatusSource, InMemorySessionStore）
//! - **cache**: セッションキャッシュ（`ehfStatus_{id}`）
//! - **app**: StatusResolver, WorkerPool, BatchResolver, StatusUpdater
//! - **table**: テーブルのソート
//! - **config**: 環境変数からの設定読み込み

pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{StatusUpdater, UpdateMode, UpdateReport};
pub use cache::{Session, SessionCache};
pub use config::{AppConfig, ConfigError};
pub use domain::{EntityId, Status, StatusBoard};
