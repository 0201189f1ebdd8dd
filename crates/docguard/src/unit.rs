//! Protected units and their cache signatures.

use std::fmt;

use crate::error::{AuthError, Result};

/// Separator between unit and member in a signature.
pub const SIGNATURE_SEPARATOR: &str = "::";

/// A type whose instances can be authorized against.
///
/// The unit name defaults to the type's own name without its module path,
/// so `my_app::handlers::Billing` is looked up as `Billing`. Override
/// [`Protected::unit_name`] when declarations use a different name.
pub trait Protected {
    fn unit_name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// Strips the module path and any generic arguments from a type name.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit(SIGNATURE_SEPARATOR).next().unwrap_or(base)
}

/// A validated reference to a protected unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitRef(String);

impl UnitRef {
    /// References a unit by name.
    ///
    /// The name must be non-blank and contain neither whitespace nor `::`.
    pub fn named(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AuthError::InvalidInput(
                "unit name must not be empty".to_string(),
            ));
        }
        if name.chars().any(char::is_whitespace) || name.contains(SIGNATURE_SEPARATOR) {
            return Err(AuthError::InvalidInput(format!(
                "'{name}' is not a unit name"
            )));
        }
        Ok(Self(name))
    }

    /// References the unit an instance belongs to.
    pub fn of<T: Protected + ?Sized>(instance: &T) -> Result<Self> {
        Self::named(instance.unit_name())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The cache signature: `Unit` or `Unit::member`.
    ///
    /// An empty member name means "no member".
    pub fn signature(&self, member: Option<&str>) -> String {
        match member.filter(|m| !m.is_empty()) {
            Some(member) => format!("{}{SIGNATURE_SEPARATOR}{member}", self.0),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for UnitRef {
    type Error = AuthError;

    fn try_from(name: &str) -> Result<Self> {
        Self::named(name)
    }
}

impl TryFrom<String> for UnitRef {
    type Error = AuthError;

    fn try_from(name: String) -> Result<Self> {
        Self::named(name)
    }
}
