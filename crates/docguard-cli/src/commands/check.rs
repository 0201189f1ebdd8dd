//! `docguard check`: decide one request.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use docguard::{Attributes, Decision, UnitRef};
use docguard_config::DocguardConfig;

use super::EXIT_DENIED;

pub fn run(
    config: &DocguardConfig,
    decl: Option<&Path>,
    unit: &str,
    member: Option<&str>,
    attrs: &[String],
    mode: Option<&str>,
    json: bool,
) -> Result<ExitCode> {
    let mut authorizer = super::authorizer(config, decl)?;
    if let Some(mode) = mode {
        authorizer.set_default_mode(mode)?;
    }

    let unit = UnitRef::named(unit)?;
    let attrs = parse_attributes(attrs)?;
    let decision = authorizer
        .decide(&unit, member, &attrs)
        .with_context(|| format!("Failed to evaluate {}", unit.signature(member)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print_decision(&unit.signature(member), &decision);
    }

    Ok(if decision.is_allowed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DENIED)
    })
}

/// Parses repeated `group=v1,v2` arguments. Repeating a group appends to it;
/// `group=` presents the group with no values.
pub fn parse_attributes(args: &[String]) -> Result<Attributes> {
    let mut attrs = Attributes::new();
    for arg in args {
        let Some((group, values)) = arg.split_once('=') else {
            bail!("Attribute '{arg}' must look like group=value1,value2");
        };
        let group = group.trim();
        if group.is_empty() {
            bail!("Attribute '{arg}' has no group name");
        }

        let mut merged: Vec<String> = attrs.get(group).map(<[String]>::to_vec).unwrap_or_default();
        merged.extend(
            values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
        );
        attrs.insert(group, merged);
    }
    Ok(attrs)
}

fn print_decision(signature: &str, decision: &Decision) {
    let verdict = if decision.is_allowed() { "allow" } else { "deny" };
    println!("{signature}: {verdict} ({} stage)", decision.stage);
    for reason in &decision.reasons {
        println!("  {reason}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_attributes() {
        let attrs = parse_attributes(&args(&["groups=admin, reg-user", "name=Bruno"])).unwrap();
        assert_eq!(
            attrs.get("groups").unwrap(),
            &["admin".to_string(), "reg-user".to_string()][..]
        );
        assert_eq!(attrs.get("name").unwrap(), &["Bruno".to_string()][..]);
    }

    #[test]
    fn test_repeated_group_appends() {
        let attrs = parse_attributes(&args(&["groups=a", "groups=b"])).unwrap();
        assert_eq!(attrs.get("groups").unwrap().len(), 2);
    }

    #[test]
    fn test_empty_group_is_present() {
        let attrs = parse_attributes(&args(&["groups="])).unwrap();
        assert!(attrs.contains("groups"));
        assert!(attrs.get("groups").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_attributes() {
        assert!(parse_attributes(&args(&["groups"])).is_err());
        assert!(parse_attributes(&args(&["=admin"])).is_err());
    }
}
