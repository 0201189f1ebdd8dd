//! Metadata sources: where the annotation text of units and members comes from.
//!
//! The extractor only needs two lookups. Anything that can answer them
//! (a parsed source tree, a build-time table, a file) can back the
//! extractor. [`DeclarationTable`] is the static implementation shipped here.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Supplies raw documentation text for units and their members.
///
/// Unknown units or members must fail with [`AuthError::LookupFailure`].
/// A known item without documentation yields an empty string.
pub trait MetadataSource: Send + Sync {
    fn unit_doc(&self, unit: &str) -> Result<String>;

    fn member_doc(&self, unit: &str, member: &str) -> Result<String>;
}

/// A unit's documentation and the documentation of its members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDeclaration {
    #[serde(default)]
    pub doc: String,
    #[serde(default)]
    pub members: HashMap<String, String>,
}

/// Static, in-memory declarations.
///
/// Can be built in code or loaded from TOML:
///
/// ```toml
/// [units.Billing]
/// doc = "@auth-groups finance"
///
/// [units.Billing.members]
/// refund = """
/// @auth-groups finance, support
/// @auth-mode or
/// """
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationTable {
    #[serde(default)]
    units: HashMap<String, UnitDeclaration>,
}

impl DeclarationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a unit with its documentation (builder pattern).
    pub fn with_unit(mut self, unit: impl Into<String>, doc: impl Into<String>) -> Self {
        self.units.entry(unit.into()).or_default().doc = doc.into();
        self
    }

    /// Declares a member. An undeclared unit is declared with an empty doc.
    pub fn with_member(
        mut self,
        unit: impl Into<String>,
        member: impl Into<String>,
        doc: impl Into<String>,
    ) -> Self {
        self.units
            .entry(unit.into())
            .or_default()
            .members
            .insert(member.into(), doc.into());
        self
    }

    /// Parses a TOML declaration document.
    pub fn from_toml_str(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Loads a TOML declaration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| AuthError::Declarations {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text).map_err(|e| AuthError::Declarations {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn members(&self, unit: &str) -> Option<impl Iterator<Item = &str>> {
        self.units
            .get(unit)
            .map(|decl| decl.members.keys().map(String::as_str))
    }

    fn unit(&self, unit: &str) -> Result<&UnitDeclaration> {
        self.units.get(unit).ok_or_else(|| AuthError::LookupFailure {
            unit: unit.to_string(),
            member: None,
        })
    }
}

impl MetadataSource for DeclarationTable {
    fn unit_doc(&self, unit: &str) -> Result<String> {
        Ok(self.unit(unit)?.doc.clone())
    }

    fn member_doc(&self, unit: &str, member: &str) -> Result<String> {
        self.unit(unit)?
            .members
            .get(member)
            .cloned()
            .ok_or_else(|| AuthError::LookupFailure {
                unit: unit.to_string(),
                member: Some(member.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lookups() {
        let table = DeclarationTable::new()
            .with_unit("Billing", "@auth-groups finance")
            .with_member("Billing", "refund", "@auth-groups support")
            .with_member("Billing", "undocumented", "");

        assert_eq!(table.unit_doc("Billing").unwrap(), "@auth-groups finance");
        assert_eq!(
            table.member_doc("Billing", "refund").unwrap(),
            "@auth-groups support"
        );
        assert_eq!(table.member_doc("Billing", "undocumented").unwrap(), "");
    }

    #[test]
    fn test_unknown_unit_and_member_fail() {
        let table = DeclarationTable::new().with_unit("Billing", "");

        assert!(matches!(
            table.unit_doc("Shipping"),
            Err(AuthError::LookupFailure { member: None, .. })
        ));
        assert!(matches!(
            table.member_doc("Billing", "refund"),
            Err(AuthError::LookupFailure { member: Some(m), .. }) if m == "refund"
        ));
        assert!(matches!(
            table.member_doc("Shipping", "refund"),
            Err(AuthError::LookupFailure { member: None, .. })
        ));
    }

    #[test]
    fn test_member_implicitly_declares_unit() {
        let table = DeclarationTable::new().with_member("Reports", "export", "");
        assert_eq!(table.unit_doc("Reports").unwrap(), "");
    }

    #[test]
    fn test_from_toml_str() {
        let table = DeclarationTable::from_toml_str(
            r#"
[units.Billing]
doc = "@auth-groups finance"

[units.Billing.members]
refund = """
@auth-groups finance, support
@auth-mode or
"""

[units.Open]
"#,
        )
        .unwrap();

        assert!(table.member_doc("Billing", "refund").unwrap().contains("@auth-mode or"));
        assert_eq!(table.unit_doc("Open").unwrap(), "");
        let mut units: Vec<&str> = table.units().collect();
        units.sort_unstable();
        assert_eq!(units, vec!["Billing", "Open"]);
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[units.Billing\ndoc = 1").unwrap();

        let err = DeclarationTable::load(file.path()).unwrap_err();
        assert!(matches!(err, AuthError::Declarations { .. }));

        let err = DeclarationTable::load("/nonexistent/declarations.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/declarations.toml"));
    }
}
