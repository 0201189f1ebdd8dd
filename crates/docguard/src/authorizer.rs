//! The authorization entry point.
//!
//! [`Authorizer`] ties an [`Extractor`] to the decision engine and carries
//! the per-instance default mode. It holds no per-call state, so one instance
//! can serve every request of a process from behind an `Arc`.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::attributes::Attributes;
use crate::cache::RuleCache;
use crate::engine::{self, Decision};
use crate::error::{AuthError, EnforcementError, Result};
use crate::extractor::Extractor;
use crate::mode::Mode;
use crate::rules::RuleSet;
use crate::source::MetadataSource;
use crate::unit::UnitRef;

/// Evaluates annotated units against caller attributes.
#[derive(Debug, Clone)]
pub struct Authorizer {
    extractor: Extractor,
    default_mode: Mode,
    audit_enabled: bool,
}

impl Authorizer {
    /// Creates an authorizer with an in-memory cache and the `or` default.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self::from_extractor(Extractor::new(source))
    }

    pub fn with_cache(source: Arc<dyn MetadataSource>, cache: Arc<dyn RuleCache>) -> Self {
        Self::from_extractor(Extractor::with_cache(source, cache))
    }

    pub fn from_extractor(extractor: Extractor) -> Self {
        Self {
            extractor,
            default_mode: Mode::default(),
            audit_enabled: true,
        }
    }

    /// Sets the mode used by rule sets that declare none (builder pattern).
    pub fn with_default_mode(mut self, mode: Mode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Disables audit logging (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    /// Sets the default mode from its token.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidArgument`] unless `mode` is `and`, `or` or `none`.
    pub fn set_default_mode(&mut self, mode: &str) -> Result<&mut Self> {
        self.default_mode = mode
            .parse::<Mode>()
            .map_err(|_| AuthError::InvalidArgument(format!("Mode '{mode}' not accepted")))?;
        Ok(self)
    }

    /// Replaces the rule cache.
    pub fn set_cache(&mut self, cache: Arc<dyn RuleCache>) -> &mut Self {
        self.extractor.set_cache(cache);
        self
    }

    pub fn default_mode(&self) -> Mode {
        self.default_mode
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Returns the effective rule set for `unit` or `unit::member`.
    pub fn extract(&self, unit: &UnitRef, member: Option<&str>) -> Result<Arc<RuleSet>> {
        self.extractor.extract(unit, member)
    }

    /// Returns whether the caller may proceed.
    ///
    /// A refusal is `Ok(false)`; only fatal conditions are errors.
    pub fn authorize(
        &self,
        unit: &UnitRef,
        member: Option<&str>,
        attrs: &Attributes,
    ) -> Result<bool> {
        Ok(self.decide(unit, member, attrs)?.is_allowed())
    }

    /// Like [`Authorizer::authorize`], with the deciding stage and reasons.
    pub fn decide(
        &self,
        unit: &UnitRef,
        member: Option<&str>,
        attrs: &Attributes,
    ) -> Result<Decision> {
        let result = self
            .extractor
            .extract(unit, member)
            .and_then(|rules| engine::evaluate(&rules, attrs, self.default_mode));

        if self.audit_enabled {
            self.audit(unit, member, &result);
        }
        result
    }

    /// Returns `Ok(())` when the caller may proceed.
    ///
    /// # Errors
    ///
    /// [`EnforcementError::Denied`] carrying the reasons when the caller is
    /// refused, and [`EnforcementError::Fatal`] when evaluation fails.
    pub fn enforce(
        &self,
        unit: &UnitRef,
        member: Option<&str>,
        attrs: &Attributes,
    ) -> std::result::Result<(), EnforcementError> {
        self.decide(unit, member, attrs)?.into_result()?;
        Ok(())
    }

    fn audit(&self, unit: &UnitRef, member: Option<&str>, result: &Result<Decision>) {
        let member = member.unwrap_or_default();
        match result {
            Ok(decision) if decision.is_allowed() => info!(
                unit = %unit,
                member,
                stage = %decision.stage,
                "Access granted"
            ),
            Ok(decision) => {
                let failed: Vec<&str> = decision.reasons.iter().map(|r| r.group.as_str()).collect();
                warn!(
                    unit = %unit,
                    member,
                    stage = %decision.stage,
                    failed_groups = ?failed,
                    "Access denied"
                );
            }
            Err(err) => error!(
                unit = %unit,
                member,
                error = %err,
                "Authorization failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::reason::Stage;
    use crate::source::DeclarationTable;

    fn authorizer() -> Authorizer {
        let table = DeclarationTable::new()
            .with_unit("Billing", "@auth-groups finance\n@auth-ban-status suspended")
            .with_member("Billing", "refund", "@auth-groups finance, support")
            .with_member("Billing", "broken", "@auth-mode sideways");
        Authorizer::new(Arc::new(table)).without_audit()
    }

    fn unit() -> UnitRef {
        UnitRef::named("Billing").unwrap()
    }

    #[test]
    fn test_authorize_boolean() {
        let auth = authorizer();
        let finance = Attributes::new().with_value("groups", "finance");
        let support = Attributes::new().with_value("groups", "support");

        assert!(auth.authorize(&unit(), None, &finance).unwrap());
        assert!(!auth.authorize(&unit(), None, &support).unwrap());
        assert!(auth.authorize(&unit(), Some("refund"), &support).unwrap());
    }

    #[test]
    fn test_set_default_mode() {
        let mut auth = authorizer();
        for token in ["and", "or", "none"] {
            auth.set_default_mode(token).unwrap();
            assert_eq!(auth.default_mode().as_str(), token);
        }

        let err = auth.set_default_mode("foo").unwrap_err();
        assert!(matches!(err, AuthError::InvalidArgument(_)));
        assert_eq!(auth.default_mode(), Mode::None, "unchanged after failure");
    }

    #[test]
    fn test_default_mode_changes_verdict() {
        let finance = Attributes::new().with_value("groups", "finance");
        let auth = authorizer().with_default_mode(Mode::None);
        assert!(!auth.authorize(&unit(), None, &finance).unwrap());
    }

    #[test]
    fn test_enforce_distinguishes_denial_from_failure() {
        let auth = authorizer();
        let suspended = Attributes::new()
            .with_value("groups", "finance")
            .with_value("status", "suspended");

        let err = auth.enforce(&unit(), None, &suspended).unwrap_err();
        let denial = err.denial().expect("ban is a denial");
        assert_eq!(denial.stage, Stage::Ban);
        assert_eq!(denial.reasons.len(), 1);
        assert_eq!(denial.reasons[0].group, "status");

        let err = auth
            .enforce(&unit(), Some("broken"), &Attributes::new())
            .unwrap_err();
        assert!(matches!(
            err,
            EnforcementError::Fatal(AuthError::InvalidMode(_))
        ));

        let finance = Attributes::new().with_value("groups", "finance");
        assert!(auth.enforce(&unit(), None, &finance).is_ok());
    }

    #[test]
    fn test_set_cache_routes_through_injected_cache() {
        let mut auth = authorizer();
        let cache = Arc::new(MemoryCache::new());
        auth.set_cache(cache.clone());

        auth.extract(&unit(), Some("refund")).unwrap();
        assert!(cache.has("Billing"));
        assert!(cache.has("Billing::refund"));
    }

    #[test]
    fn test_audit_does_not_change_verdict() {
        let audited = authorizer();
        let audited = Authorizer {
            audit_enabled: true,
            ..audited
        };
        let attrs = Attributes::new().with_value("groups", "support");
        assert!(!audited.authorize(&unit(), None, &attrs).unwrap());
        assert!(audited.authorize(&unit(), Some("missing"), &attrs).is_err());
    }
}
