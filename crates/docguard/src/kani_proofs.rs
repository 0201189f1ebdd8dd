//! Kani proofs for rule evaluation
//!
//! Bounded model checks over the decision engine: determinism, the empty
//! rule set, ban dominance and `and` order independence.
//!
//! Run with: `cargo kani --tests --harness verify_*`

#[cfg(kani)]
use crate::attributes::Attributes;
#[cfg(kani)]
use crate::engine::{self, Effect};
#[cfg(kani)]
use crate::mode::Mode;
#[cfg(kani)]
use crate::reason::Stage;
#[cfg(kani)]
use crate::rules::RuleSet;

#[cfg(kani)]
fn any_mode() -> Mode {
    match kani::any::<u8>() % 3 {
        0 => Mode::And,
        1 => Mode::Or,
        _ => Mode::None,
    }
}

#[cfg(kani)]
fn pick(index: u8) -> &'static str {
    ["a", "b", "c"][usize::from(index % 3)]
}

/// **Property**: Same inputs always produce the same decision
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(6)]
fn verify_evaluation_determinism() {
    let rules = RuleSet::new()
        .with_rule("groups", [pick(kani::any()), pick(kani::any())])
        .with_mode(any_mode().as_str());
    let attrs = Attributes::new().with_value("groups", pick(kani::any()));
    let default_mode = any_mode();

    let first = engine::evaluate(&rules, &attrs, default_mode);
    let second = engine::evaluate(&rules, &attrs, default_mode);

    assert_eq!(first.ok(), second.ok());
}

/// **Property**: An empty rule set allows every caller
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_empty_rules_allow() {
    let attrs = Attributes::new().with_value("groups", pick(kani::any()));

    let decision = engine::evaluate(&RuleSet::new(), &attrs, any_mode());

    assert!(matches!(decision, Ok(ref d) if d.is_allowed()));
}

/// **Property**: A ban hit denies before any mode is consulted
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(6)]
fn verify_ban_short_circuits() {
    let value = pick(kani::any());
    let rules = RuleSet::new()
        .with_rule("groups", [value])
        .with_rule("ban-status", [value])
        .with_mode("not-a-mode");
    let attrs = Attributes::new()
        .with_value("groups", value)
        .with_value("status", value);

    let decision = engine::evaluate(&rules, &attrs, any_mode());

    assert!(matches!(
        decision,
        Ok(ref d) if d.effect == Effect::Deny && d.stage == Stage::Ban
    ));
}

/// **Property**: `and` does not depend on the order of the caller's values
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(6)]
fn verify_and_order_independence() {
    let (x, y) = (pick(kani::any()), pick(kani::any()));
    let rules = RuleSet::new().with_rule("groups", [pick(kani::any()), pick(kani::any())]);

    let forward = Attributes::new().with_values("groups", [x, y]);
    let reversed = Attributes::new().with_values("groups", [y, x]);

    let a = engine::evaluate(&rules, &forward, Mode::And).map(|d| d.effect);
    let b = engine::evaluate(&rules, &reversed, Mode::And).map(|d| d.effect);

    assert_eq!(a.ok(), b.ok());
}
