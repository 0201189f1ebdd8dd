//! Integration tests for CLI commands.
//!
//! Each test runs the binary against a declaration file in a temp project
//! directory.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DECLARATIONS: &str = r#"
[units.Billing]
doc = """
@auth-groups finance, admin
@auth-permissions refund
"""

[units.Billing.members]
refund = """
@auth-groups support
@auth-ban-status suspended
"""
audit = "@auth-mode none\n@auth-groups intern"
exact = "@auth-mode and\n@auth-groups finance, admin"
untagged = "Plain documentation."
broken = "@auth-mode sideways"

[units.Open]
doc = "No rules here."
"#;

fn project() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("declarations.toml"), DECLARATIONS)
        .expect("Failed to write declarations");
    dir
}

fn docguard(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docguard").unwrap();
    cmd.arg("--project")
        .arg(dir)
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env("DOCGUARD_LOGGING__LEVEL", "error");
    cmd
}

// ============================================================================
// check
// ============================================================================

#[test]
fn check_allows_matching_group() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--attr", "groups=admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Billing: allow (or stage)"));
}

#[test]
fn check_denies_with_reasons() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--attr", "groups=guest"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("deny"))
        .stdout(predicate::str::contains("groups: has [guest]"));
}

#[test]
fn check_member_rules_replace_unit_rules() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--member", "refund", "--attr", "groups=admin"])
        .assert()
        .code(1);

    docguard(dir.path())
        .args(["check", "Billing", "--member", "refund", "--attr", "groups=support"])
        .assert()
        .success();
}

#[test]
fn check_untagged_member_inherits_unit_rules() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--member", "untagged", "--attr", "groups=finance"])
        .assert()
        .success();
}

#[test]
fn check_ban_reports_single_reason_as_json() {
    let dir = project();
    docguard(dir.path())
        .args([
            "check",
            "Billing",
            "--member",
            "refund",
            "--attr",
            "groups=support",
            "--attr",
            "status=suspended",
            "--json",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""effect": "deny""#))
        .stdout(predicate::str::contains(r#""stage": "ban""#))
        .stdout(predicate::str::contains(r#""group": "status""#));
}

#[test]
fn check_and_mode_requires_exact_sets() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--member", "exact", "--attr", "groups=admin,finance"])
        .assert()
        .success();

    docguard(dir.path())
        .args(["check", "Billing", "--member", "exact", "--attr", "groups=admin"])
        .assert()
        .code(1);
}

#[test]
fn check_none_mode_allows_anonymous() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--member", "audit"])
        .assert()
        .success();

    docguard(dir.path())
        .args(["check", "Billing", "--member", "audit", "--attr", "groups=intern"])
        .assert()
        .code(1);
}

#[test]
fn check_unrestricted_unit_allows_everyone() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unrestricted"));
}

#[test]
fn check_mode_flag_sets_default_mode() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--attr", "groups=admin", "--mode", "none"])
        .assert()
        .code(1);
}

#[test]
fn check_rejects_unknown_mode_flag() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--mode", "xor"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Mode 'xor' not accepted"));
}

#[test]
fn check_invalid_declared_mode_is_fatal() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--member", "broken"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sideways"));
}

#[test]
fn check_unknown_member_is_fatal() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--member", "missing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing"));
}

#[test]
fn check_missing_declarations_is_fatal() {
    let dir = TempDir::new().unwrap();
    docguard(dir.path())
        .args(["check", "Billing"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("declarations"));
}

#[test]
fn check_malformed_attribute_is_fatal() {
    let dir = project();
    docguard(dir.path())
        .args(["check", "Billing", "--attr", "groups"])
        .assert()
        .code(2);
}

#[test]
fn check_decl_flag_overrides_config() {
    let dir = project();
    let other = TempDir::new().unwrap();
    let decl = other.path().join("other.toml");
    fs::write(&decl, "[units.Billing]\ndoc = \"@auth-groups ops\"\n").unwrap();

    docguard(dir.path())
        .arg("--decl")
        .arg(&decl)
        .args(["check", "Billing", "--attr", "groups=ops"])
        .assert()
        .success();
}

#[test]
fn check_default_mode_from_environment() {
    let dir = project();
    docguard(dir.path())
        .env("DOCGUARD_EVALUATION__DEFAULT_MODE", "none")
        .args(["check", "Billing", "--attr", "groups=admin"])
        .assert()
        .code(1);
}

// ============================================================================
// File cache
// ============================================================================

#[test]
fn file_cache_persists_rules() {
    let dir = project();
    fs::write(
        dir.path().join("docguard.toml"),
        "[cache]\nbackend = \"file\"\npath = \"state/rules.json\"\n",
    )
    .unwrap();

    docguard(dir.path())
        .args(["check", "Billing", "--member", "refund", "--attr", "groups=support"])
        .assert()
        .success();

    let snapshot = fs::read_to_string(dir.path().join("state/rules.json")).unwrap();
    assert!(snapshot.contains("Billing::refund"));

    // Edited declarations replace the persisted rules.
    fs::write(
        dir.path().join("declarations.toml"),
        "[units.Billing]\ndoc = \"\"\n[units.Billing.members]\nrefund = \"@auth-groups admin\"\n",
    )
    .unwrap();
    docguard(dir.path())
        .args(["check", "Billing", "--member", "refund", "--attr", "groups=admin"])
        .assert()
        .success();
    docguard(dir.path())
        .args(["check", "Billing", "--member", "refund", "--attr", "groups=support"])
        .assert()
        .code(1);
}

#[test]
fn cache_clear_empties_snapshot() {
    let dir = project();
    fs::write(
        dir.path().join("docguard.toml"),
        "[cache]\nbackend = \"file\"\npath = \"state/rules.json\"\n",
    )
    .unwrap();

    docguard(dir.path())
        .args(["check", "Billing", "--member", "refund", "--attr", "groups=support"])
        .assert()
        .success();

    docguard(dir.path())
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared rule cache"));

    let snapshot = fs::read_to_string(dir.path().join("state/rules.json")).unwrap();
    assert!(!snapshot.contains("Billing::refund"));
}

#[test]
fn cache_clear_with_memory_backend_is_a_no_op() {
    let dir = project();
    docguard(dir.path())
        .args(["cache", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to clear"));
}

// ============================================================================
// rules / config
// ============================================================================

#[test]
fn rules_prints_effective_rule_set() {
    let dir = project();
    docguard(dir.path())
        .args(["rules", "Billing", "--member", "refund"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""key": "ban-status""#))
        .stdout(predicate::str::contains("support"));
}

#[test]
fn rules_for_untagged_member_show_unit_rules() {
    let dir = project();
    docguard(dir.path())
        .args(["rules", "Billing", "--member", "untagged"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""key": "permissions""#));
}

#[test]
fn config_prints_resolved_toml() {
    let dir = project();
    fs::write(
        dir.path().join("docguard.toml"),
        "[evaluation]\ndefault_mode = \"and\"\n",
    )
    .unwrap();

    docguard(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[evaluation]"))
        .stdout(predicate::str::contains("default_mode = \"and\""))
        .stdout(predicate::str::contains("backend = \"memory\""));
}

#[test]
fn invalid_config_is_fatal() {
    let dir = project();
    fs::write(
        dir.path().join("docguard.toml"),
        "[cache]\nbackend = \"file\"\npath = \"\"\n",
    )
    .unwrap();

    docguard(dir.path())
        .arg("config")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cache.path"));
}
