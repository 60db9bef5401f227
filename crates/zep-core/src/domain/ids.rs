//! Instance identifiers.
//!
//! 各 `Zep` インスタンスは ULID ベースの ID を持ち、ログの相関に使います。
//! ULID は生成順でソート可能なので、ログを時系列で追いやすくなります。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of one debouncer instance.
///
/// Display は `zep-` プレフィックス付き（例: `zep-01HV...`）。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZepId(Ulid);

impl ZepId {
    const PREFIX: &'static str = "zep-";

    /// 新しい ID を生成
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for ZepId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for ZepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}
