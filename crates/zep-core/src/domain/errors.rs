//! Errors - エラー型
//!
//! 実行時に発生しうるのは callback の失敗のみ。
//! それ以外は構築時の入力検証で弾く。

use thiserror::Error;

/// Boxed error returned by a failing callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ZepError {
    /// Construction input was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A period was configured but there is no tokio runtime to drive the timer.
    #[error("debounced mode requires a tokio runtime, none is running on this thread")]
    NoRuntime,

    /// The callback returned an error.
    #[error("callback failed: {0}")]
    Callback(#[source] BoxError),

    /// The callback panicked. The payload message is kept when it is a string.
    #[error("callback panicked: {0}")]
    CallbackPanicked(String),
}

impl ZepError {
    /// Did this error come out of the user callback?
    pub fn is_callback_error(&self) -> bool {
        matches!(self, ZepError::Callback(_) | ZepError::CallbackPanicked(_))
    }
}
