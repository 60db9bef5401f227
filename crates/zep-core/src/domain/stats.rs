//! Stats - 実行統計のスナップショット

use std::fmt;

use serde::Serialize;

use super::ids::ZepId;

/// Point-in-time view of a `Zep`.
///
/// Lifecycle handlers receive this instead of the instance itself, so a
/// handler can inspect counters without touching the debouncer's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZepStats {
    pub id: ZepId,
    /// Number of counted `run()` calls.
    pub calls: u64,
    pub timers_created: u64,
    pub executions: u64,
    pub is_waiting: bool,
    pub is_running: bool,
    pub was_cancelled: bool,
    pub was_aborted: bool,
}

impl ZepStats {
    /// Percentage of calls that were coalesced away, rounded to two decimals.
    ///
    /// Reported as 0 when either count is zero.
    pub fn savings_percent(&self) -> f64 {
        if self.calls == 0 || self.executions == 0 {
            return 0.0;
        }
        let ratio = self.executions as f64 / self.calls as f64;
        (100.0 * (1.0 - ratio) * 100.0).round() / 100.0
    }
}

impl fmt::Display for ZepStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Zep]: calls: {}, timers created: {}, callback executions: {}, savings: {:.2}%.",
            self.calls,
            self.timers_created,
            self.executions,
            self.savings_percent()
        )
    }
}
