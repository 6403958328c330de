use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use fulfil_core::DomainError;

/// Delivery platforms we integrate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Hanger,
    Kita,
}

impl PlatformKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformKind::Hanger => "hanger",
            PlatformKind::Kita => "kita",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hanger" => Ok(PlatformKind::Hanger),
            "kita" => Ok(PlatformKind::Kita),
            other => Err(DomainError::validation(format!(
                "unknown delivery platform: {other}"
            ))),
        }
    }
}
