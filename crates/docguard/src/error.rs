//! Error types for rule extraction and evaluation.
//!
//! Fatal conditions are [`AuthError`]. A denied request is *not* an error
//! for [`crate::Authorizer::authorize`] and [`crate::Authorizer::decide`];
//! only [`crate::Authorizer::enforce`] surfaces it, as
//! [`EnforcementError::Denied`], so callers can tell the two apart by type.

use std::path::PathBuf;

use thiserror::Error;

use crate::reason::Denial;

/// Fatal errors raised while extracting or evaluating rules.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The unit argument does not name a usable unit.
    #[error("Invalid unit: {0}")]
    InvalidInput(String),

    /// The resolved mode is outside `and`, `or`, `none`.
    #[error("Invalid mode '{0}': expected one of and, or, none")]
    InvalidMode(String),

    /// A configuration argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The metadata source does not know the requested unit or member.
    #[error("{}", lookup_message(.unit, .member))]
    LookupFailure {
        unit: String,
        member: Option<String>,
    },

    /// A declaration table could not be read or parsed.
    #[error("Failed to load declarations from {path}: {message}")]
    Declarations { path: PathBuf, message: String },

    /// A persistent cache failed to read or write its backing store.
    #[error("Rule cache error: {0}")]
    Cache(String),
}

fn lookup_message(unit: &str, member: &Option<String>) -> String {
    match member {
        Some(member) => format!("Unknown member '{member}' on unit '{unit}'"),
        None => format!("Unknown unit '{unit}'"),
    }
}

/// Result type for extraction and evaluation.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error returned by [`crate::Authorizer::enforce`].
#[derive(Debug, Error)]
pub enum EnforcementError {
    /// The caller was evaluated and refused.
    #[error(transparent)]
    Denied(#[from] Denial),

    /// Evaluation could not complete.
    #[error(transparent)]
    Fatal(#[from] AuthError),
}

impl EnforcementError {
    /// Returns the denial, if this is an ordinary refusal.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Denied(denial) => Some(denial),
            Self::Fatal(_) => None,
        }
    }
}
