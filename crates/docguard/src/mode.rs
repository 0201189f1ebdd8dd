//! Combination modes for rule groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// How the non-ban rules of a rule set combine into a verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every rule group must be present and set-equal to the caller's values.
    And,
    /// Any rule group intersecting the caller's values allows.
    #[default]
    Or,
    /// Any rule group intersecting the caller's values denies.
    None,
}

impl Mode {
    /// All accepted modes.
    pub const ALL: [Mode; 3] = [Mode::And, Mode::Or, Mode::None];

    /// The annotation token for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::None => "none",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AuthError;

    /// Parses an already-normalized token. Case is significant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "none" => Ok(Self::None),
            other => Err(AuthError::InvalidMode(other.to_string())),
        }
    }
}
