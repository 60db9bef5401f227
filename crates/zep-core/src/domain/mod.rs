//! Domain model (ids, config, stats, errors).

pub mod config;
pub mod errors;
pub mod ids;
pub mod stats;

pub use self::config::{CancelPolicy, ZepConfig};
pub use self::errors::{BoxError, ZepError};
pub use self::ids::ZepId;
pub use self::stats::ZepStats;
