//! Ports - 抽象化レイヤー
//!
//! 外部システム（HTTP バックエンド, ブラウザのセッションストレージ, 時計）への
//! インターフェースを trait として定義し、実装の詳細を隠蔽します。

pub mod clock;
pub mod session_store;
pub mod status_source;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::session_store::SessionStore;
pub use self::status_source::{SourceError, StatusSource};
