//! `docguard rules`: show the effective rule set.

use std::path::Path;

use anyhow::{Context, Result};
use docguard::UnitRef;
use docguard_config::DocguardConfig;

pub fn run(
    config: &DocguardConfig,
    decl: Option<&Path>,
    unit: &str,
    member: Option<&str>,
) -> Result<()> {
    let authorizer = super::authorizer(config, decl)?;
    let unit = UnitRef::named(unit)?;
    let rules = authorizer
        .extract(&unit, member)
        .with_context(|| format!("Failed to extract rules for {}", unit.signature(member)))?;

    println!("{}", serde_json::to_string_pretty(&*rules)?);
    Ok(())
}
