//! Lifecycle handler slots.
//!
//! Each slot holds at most one handler; registering again replaces it.

use std::fmt;
use std::sync::Arc;

use crate::domain::{ZepError, ZepStats};

pub(crate) type StatsHandler = Arc<dyn Fn(&ZepStats) + Send + Sync>;
pub(crate) type ErrorHandler = Arc<dyn Fn(&ZepError) + Send + Sync>;

/// Lifecycle points that notify a handler with a stats snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    BeforeRun,
    AfterRun,
    Completed,
    Cancelled,
    Aborted,
}

impl LifecycleEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::BeforeRun => "before_run",
            LifecycleEvent::AfterRun => "after_run",
            LifecycleEvent::Completed => "completed",
            LifecycleEvent::Cancelled => "cancelled",
            LifecycleEvent::Aborted => "aborted",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
pub(crate) struct Handlers {
    before_run: Option<StatsHandler>,
    after_run: Option<StatsHandler>,
    completed: Option<StatsHandler>,
    cancelled: Option<StatsHandler>,
    aborted: Option<StatsHandler>,
    error: Option<ErrorHandler>,
}

impl Handlers {
    fn slot_mut(&mut self, event: LifecycleEvent) -> &mut Option<StatsHandler> {
        match event {
            LifecycleEvent::BeforeRun => &mut self.before_run,
            LifecycleEvent::AfterRun => &mut self.after_run,
            LifecycleEvent::Completed => &mut self.completed,
            LifecycleEvent::Cancelled => &mut self.cancelled,
            LifecycleEvent::Aborted => &mut self.aborted,
        }
    }

    pub(crate) fn set(&mut self, event: LifecycleEvent, handler: StatsHandler) {
        *self.slot_mut(event) = Some(handler);
    }

    pub(crate) fn set_error(&mut self, handler: ErrorHandler) {
        self.error = Some(handler);
    }

    /// Cloned out so the caller can invoke it after releasing the lock.
    pub(crate) fn get(&self, event: LifecycleEvent) -> Option<StatsHandler> {
        let slot = match event {
            LifecycleEvent::BeforeRun => &self.before_run,
            LifecycleEvent::AfterRun => &self.after_run,
            LifecycleEvent::Completed => &self.completed,
            LifecycleEvent::Cancelled => &self.cancelled,
            LifecycleEvent::Aborted => &self.aborted,
        };
        slot.clone()
    }

    pub(crate) fn error(&self) -> Option<ErrorHandler> {
        self.error.clone()
    }
}
