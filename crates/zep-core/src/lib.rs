//! zep-core
//!
//! Debounce a callback: many `run()` calls inside one period collapse into a
//! single execution on a recurring timer tick, using the latest arguments.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, config, stats, errors）
//! - **app**: `Zep` 本体、周期タイマー、lifecycle handler
//!
//! Debounced mode runs its timer on the tokio runtime that is current when
//! the `Zep` is constructed. Immediate mode needs no runtime.

pub mod app;
pub mod domain;

pub use app::{CallbackOutcome, Debouncer, LifecycleEvent, WeakZep, Zep};
pub use domain::{BoxError, CancelPolicy, ZepConfig, ZepError, ZepId, ZepStats};
