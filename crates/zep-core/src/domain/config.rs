//! Debouncer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::ZepError;

/// What a pending `cancel()` does to the tick that observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Mark the cycle as cancelled, then still run the callback on that tick.
    #[default]
    RunThisTick,

    /// Mark the cycle as cancelled and skip the callback on that tick.
    SkipThisTick,
}

/// Construction-time settings of a `Zep`.
///
/// On the wire the period is `period_ms`; a missing value or one `<= 0`
/// selects immediate mode.
///
/// ```ignore
/// let config: ZepConfig = serde_json::from_str(r#"{ "period_ms": 200 }"#)?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawConfig", into = "RawConfig")]
pub struct ZepConfig {
    /// `None` disables debouncing. Never `Some(Duration::ZERO)`.
    pub period: Option<Duration>,
    pub cancel_policy: CancelPolicy,
}

impl ZepConfig {
    /// Callback runs synchronously inside every `run()`.
    pub fn immediate() -> Self {
        Self::default()
    }

    /// A zero period means immediate mode.
    pub fn with_period(period: Duration) -> Self {
        Self {
            period: (!period.is_zero()).then_some(period),
            cancel_policy: CancelPolicy::default(),
        }
    }

    /// `<= 0` means immediate mode.
    pub fn from_millis(millis: i64) -> Self {
        match u64::try_from(millis) {
            Ok(ms) => Self::with_period(Duration::from_millis(ms)),
            Err(_) => Self::immediate(),
        }
    }

    /// Fractional seconds. `<= 0` means immediate mode, NaN and infinity are rejected.
    pub fn from_secs_f64(secs: f64) -> Result<Self, ZepError> {
        if !secs.is_finite() {
            return Err(ZepError::InvalidArgument(format!(
                "period must be a finite number of seconds, got {secs}"
            )));
        }
        if secs <= 0.0 {
            return Ok(Self::immediate());
        }
        let period = Duration::try_from_secs_f64(secs)
            .map_err(|e| ZepError::InvalidArgument(format!("period {secs}s: {e}")))?;
        Ok(Self::with_period(period))
    }

    pub fn cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.cancel_policy = policy;
        self
    }

    pub fn is_debounced(&self) -> bool {
        self.period.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    period_ms: Option<i64>,
    #[serde(default)]
    cancel_policy: CancelPolicy,
}

impl From<RawConfig> for ZepConfig {
    fn from(raw: RawConfig) -> Self {
        let config = raw.period_ms.map(Self::from_millis).unwrap_or_default();
        config.cancel_policy(raw.cancel_policy)
    }
}

impl From<ZepConfig> for RawConfig {
    fn from(config: ZepConfig) -> Self {
        Self {
            period_ms: config
                .period
                .map(|p| i64::try_from(p.as_millis()).unwrap_or(i64::MAX)),
            cancel_policy: config.cancel_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::positive(r#"{ "period_ms": 200 }"#, Some(Duration::from_millis(200)))]
    #[case::zero(r#"{ "period_ms": 0 }"#, None)]
    #[case::negative(r#"{ "period_ms": -5 }"#, None)]
    #[case::missing("{}", None)]
    fn period_from_json(#[case] json: &str, #[case] expected: Option<Duration>) {
        let config: ZepConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.period, expected);
        assert_eq!(config.cancel_policy, CancelPolicy::RunThisTick);
    }

    #[test]
    fn cancel_policy_from_json() {
        let config: ZepConfig =
            serde_json::from_str(r#"{ "period_ms": 50, "cancel_policy": "skip_this_tick" }"#)
                .unwrap();
        assert_eq!(config.cancel_policy, CancelPolicy::SkipThisTick);
    }

    #[test]
    fn serializes_period_as_millis() {
        let config = ZepConfig::with_period(Duration::from_millis(250));
        let value = serde_json::to_value(config).unwrap();

        assert_eq!(value["period_ms"], 250);
        assert_eq!(value["cancel_policy"], "run_this_tick");
    }

    #[test]
    fn zero_duration_is_immediate() {
        assert!(!ZepConfig::with_period(Duration::ZERO).is_debounced());
        assert!(ZepConfig::with_period(Duration::from_millis(1)).is_debounced());
    }

    #[rstest]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn non_finite_seconds_are_rejected(#[case] secs: f64) {
        let err = ZepConfig::from_secs_f64(secs).unwrap_err();
        assert!(matches!(err, ZepError::InvalidArgument(_)));
    }

    #[test]
    fn fractional_seconds() {
        let config = ZepConfig::from_secs_f64(0.25).unwrap();
        assert_eq!(config.period, Some(Duration::from_millis(250)));

        assert!(!ZepConfig::from_secs_f64(-1.0).unwrap().is_debounced());
    }
}
