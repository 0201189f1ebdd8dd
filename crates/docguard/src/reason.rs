//! Structured explanations for denied requests.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mode::Mode;

/// The evaluation phase that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "stage", content = "mode")]
pub enum Stage {
    /// The rule set was empty; nothing was checked.
    Unrestricted,
    /// A `ban-*` rule matched.
    Ban,
    /// The combination mode decided.
    Mode(Mode),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => f.write_str("unrestricted"),
            Self::Ban => f.write_str("ban"),
            Self::Mode(mode) => write!(f, "{mode}"),
        }
    }
}

/// Why a single rule group failed.
///
/// `group` is the attribute group the rule applies to. For a ban this is the
/// group name with the `ban-` prefix removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reason {
    pub group: String,
    /// Values the caller presented for the group (empty when absent).
    pub has: Vec<String>,
    /// Values the rule requires or forbids.
    pub needs: Vec<String>,
}

impl Reason {
    pub fn new(group: impl Into<String>, has: &[String], needs: &[String]) -> Self {
        Self {
            group: group.into(),
            has: has.to_vec(),
            needs: needs.to_vec(),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: has [{}], rule lists [{}]",
            self.group,
            self.has.join(", "),
            self.needs.join(", ")
        )
    }
}

/// A refused request, with the reasons collected while evaluating it.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Access denied by {stage} rules{}", format_reasons(.reasons))]
pub struct Denial {
    pub stage: Stage,
    pub reasons: Vec<Reason>,
}

impl Denial {
    pub fn has_reasons(&self) -> bool {
        !self.reasons.is_empty()
    }
}

fn format_reasons(reasons: &[Reason]) -> String {
    if reasons.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = reasons.iter().map(ToString::to_string).collect();
    format!(": {}", parts.join("; "))
}
