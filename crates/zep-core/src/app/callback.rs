//! Callback - ユーザー callback の型消去と失敗の捕捉
//!
//! callback の失敗（`Err` と panic の両方）はここで `ZepError` に変換され、
//! `run()` の呼び出し元やタイマーには決して伝播しない。

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::domain::{BoxError, ZepError};

/// Return types accepted from a callback.
///
/// Plain `()` closures never fail; `Result<(), E>` closures report `E`.
pub trait CallbackOutcome {
    fn into_result(self) -> Result<(), BoxError>;
}

impl CallbackOutcome for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> CallbackOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

pub(crate) type DynCallback<A> = Box<dyn Fn(A) -> Result<(), BoxError> + Send + Sync>;

pub(crate) fn erase<A, F, R>(callback: F) -> DynCallback<A>
where
    F: Fn(A) -> R + Send + Sync + 'static,
    R: CallbackOutcome,
{
    Box::new(move |args| callback(args).into_result())
}

/// Run the callback once, converting both `Err` and panics into `ZepError`.
pub(crate) fn invoke<A>(callback: &DynCallback<A>, args: A) -> Result<(), ZepError> {
    match panic::catch_unwind(AssertUnwindSafe(|| callback(args))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ZepError::Callback(e)),
        Err(payload) => Err(ZepError::CallbackPanicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
