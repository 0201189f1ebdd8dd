//! # docguard: Annotation-Driven Access Control
//!
//! Decides whether a caller may use a protected unit (optionally narrowed to
//! one of its members) from declarative `@auth-*` tags attached to that unit
//! and the caller's attributes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  authorize(unit, member, attributes)         │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Extractor                                   │
//! │  ├─ MetadataSource: raw doc text             │
//! │  ├─ Parse @auth-<key> <values> tags          │
//! │  ├─ RuleCache: Unit, then Unit::member       │
//! │  └─ Untagged member inherits unit rules      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Decision Engine                             │
//! │  ├─ Empty rule set: allow                    │
//! │  ├─ ban-<group>: deny on any intersection    │
//! │  └─ Mode: and / or / none                    │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Decision                                    │
//! │  - Effect (Allow/Deny)                       │
//! │  - Deciding stage                            │
//! │  - Reasons (group, has, needs)               │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Modes
//!
//! | Mode   | Allows when                                                   |
//! |--------|---------------------------------------------------------------|
//! | `and`  | every group is present and set-equal to the rule's values     |
//! | `or`   | any group shares at least one value with the rule             |
//! | `none` | no group shares any value with the rule                       |
//!
//! ## Examples
//!
//! ```
//! use std::sync::Arc;
//! use docguard::{Attributes, Authorizer, DeclarationTable, UnitRef};
//!
//! let table = DeclarationTable::new()
//!     .with_unit("Billing", "@auth-groups finance, admin")
//!     .with_member("Billing", "refund", "@auth-groups support\n@auth-ban-status suspended");
//!
//! let auth = Authorizer::new(Arc::new(table));
//! let billing = UnitRef::named("Billing").unwrap();
//!
//! let admin = Attributes::new().with_value("groups", "admin");
//! assert!(auth.authorize(&billing, None, &admin).unwrap());
//!
//! // The member declares its own rules, so the unit's rules do not apply.
//! assert!(!auth.authorize(&billing, Some("refund"), &admin).unwrap());
//!
//! let suspended = Attributes::new()
//!     .with_value("groups", "support")
//!     .with_value("status", "suspended");
//! let decision = auth.decide(&billing, Some("refund"), &suspended).unwrap();
//! assert!(!decision.is_allowed());
//! assert_eq!(decision.reasons[0].group, "status");
//! ```

pub mod attributes;
pub mod authorizer;
pub mod cache;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod mode;
pub mod reason;
pub mod rules;
pub mod source;
pub mod unit;

// Kani proofs for bounded model checking
#[cfg(any(test, kani))]
mod kani_proofs;


pub use attributes::{AttributeValue, Attributes};
pub use authorizer::Authorizer;
pub use cache::{FileCache, MemoryCache, RuleCache};
pub use engine::{Decision, Effect, evaluate};
pub use error::{AuthError, EnforcementError, Result};
pub use extractor::Extractor;
pub use mode::Mode;
pub use reason::{Denial, Reason, Stage};
pub use rules::{Rule, RuleSet, RuleTag, parse_tags};
pub use source::{DeclarationTable, MetadataSource, UnitDeclaration};
pub use unit::{Protected, UnitRef};
