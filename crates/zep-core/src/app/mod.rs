//! App - debouncer の実装
//!
//! # 主要コンポーネント
//! - **Zep**: 状態機械と公開 API
//! - **RecurringTimer**: tokio 上の周期タイマー
//! - **Handlers**: lifecycle handler のスロット
//! - **callback**: callback の型消去と失敗の捕捉

pub mod callback;
pub mod handlers;
pub mod timer;
pub mod zep;

pub use self::callback::CallbackOutcome;
pub use self::handlers::LifecycleEvent;
pub use self::zep::{Debouncer, WeakZep, Zep};
