//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpStatusSource**: reqwest によるバックエンド問い合わせ
//! - **InMemorySessionStore**: セッション単位のキャッシュストア

pub mod http_source;
pub mod inmem_session;

pub use self::http_source::{DEFAULT_BULK_PATH, HttpStatusSource};
pub use self::inmem_session::InMemorySessionStore;
