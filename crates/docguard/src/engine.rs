//! The decision engine.
//!
//! Evaluation runs in three phases over a [`RuleSet`]:
//!
//! 1. An empty set allows unconditionally.
//! 2. Ban rules deny on any intersection between the forbidden values and
//!    the caller's values for the named group, regardless of mode.
//! 3. The remaining rules are combined by the resolved [`Mode`].
//!
//! Reasons are collected alongside the verdict but never change it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::error::Result;
use crate::mode::Mode;
use crate::reason::{Denial, Reason, Stage};
use crate::rules::{Rule, RuleSet};

// ============================================================================
// Decision
// ============================================================================

/// Allow or deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

/// The outcome of evaluating a rule set against caller attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub effect: Effect,
    /// The phase that produced the verdict.
    pub stage: Stage,
    /// Failed groups. Empty on allow.
    pub reasons: Vec<Reason>,
}

impl Decision {
    fn allow(stage: Stage) -> Self {
        Self {
            effect: Effect::Allow,
            stage,
            reasons: Vec::new(),
        }
    }

    fn deny(stage: Stage, reasons: Vec<Reason>) -> Self {
        Self {
            effect: Effect::Deny,
            stage,
            reasons,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }

    /// Converts a deny into a [`Denial`]; `Ok(())` on allow.
    pub fn into_result(self) -> std::result::Result<(), Denial> {
        match self.effect {
            Effect::Allow => Ok(()),
            Effect::Deny => Err(Denial {
                stage: self.stage,
                reasons: self.reasons,
            }),
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Resolves the mode for `rules`: its own `mode` tag, else `default_mode`.
///
/// # Errors
///
/// [`crate::AuthError::InvalidMode`] when the declared token is unknown.
pub fn resolve_mode(rules: &RuleSet, default_mode: Mode) -> Result<Mode> {
    rules.mode().map_or(Ok(default_mode), str::parse)
}

/// Evaluates `rules` against `attrs`.
///
/// # Errors
///
/// [`crate::AuthError::InvalidMode`] when the rule set declares an unknown
/// mode and no ban has already denied. This is fatal, never a deny.
pub fn evaluate(rules: &RuleSet, attrs: &Attributes, default_mode: Mode) -> Result<Decision> {
    if rules.is_empty() {
        return Ok(Decision::allow(Stage::Unrestricted));
    }

    if let Some(reason) = first_ban_hit(rules, attrs) {
        return Ok(Decision::deny(Stage::Ban, vec![reason]));
    }

    let mode = resolve_mode(rules, default_mode)?;

    let requirements = rules.requirements();
    let stage = Stage::Mode(mode);
    let decision = match mode {
        Mode::And => {
            let reasons: Vec<Reason> = requirements
                .filter(|rule| !values_equal(attrs.get(&rule.key), &rule.values))
                .map(|rule| reason_for(rule, &rule.key, attrs))
                .collect();
            if reasons.is_empty() {
                Decision::allow(stage)
            } else {
                Decision::deny(stage, reasons)
            }
        }
        Mode::Or => {
            let mut reasons = Vec::new();
            for rule in requirements {
                if intersects(attrs.get(&rule.key), &rule.values) {
                    return Ok(Decision::allow(stage));
                }
                reasons.push(reason_for(rule, &rule.key, attrs));
            }
            Decision::deny(stage, reasons)
        }
        Mode::None => {
            let reasons: Vec<Reason> = requirements
                .filter(|rule| intersects(attrs.get(&rule.key), &rule.values))
                .map(|rule| reason_for(rule, &rule.key, attrs))
                .collect();
            if reasons.is_empty() {
                Decision::allow(stage)
            } else {
                Decision::deny(stage, reasons)
            }
        }
    };

    Ok(decision)
}

// ============================================================================
// Helpers
// ============================================================================

fn first_ban_hit(rules: &RuleSet, attrs: &Attributes) -> Option<Reason> {
    rules.bans().find_map(|rule| {
        let group = rule.ban_group()?;
        intersects(attrs.get(group), &rule.values).then(|| reason_for(rule, group, attrs))
    })
}

fn reason_for(rule: &Rule, group: &str, attrs: &Attributes) -> Reason {
    Reason::new(group, attrs.get(group).unwrap_or_default(), &rule.values)
}

/// True when the caller has the group and shares at least one value.
fn intersects(has: Option<&[String]>, needs: &[String]) -> bool {
    has.is_some_and(|has| has.iter().any(|v| needs.contains(v)))
}

/// True when the caller has the group with exactly the rule's values,
/// ignoring order and repetition.
fn values_equal(has: Option<&[String]>, needs: &[String]) -> bool {
    has.is_some_and(|has| {
        let has: BTreeSet<&str> = has.iter().map(String::as_str).collect();
        let needs: BTreeSet<&str> = needs.iter().map(String::as_str).collect();
        has == needs
    })
}

// ============================================================================
// Tests
// ============================================================================
