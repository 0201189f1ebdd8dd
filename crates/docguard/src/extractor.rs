//! Rule extraction with two-level caching.
//!
//! The unit-level set is computed and cached under `Unit`. A member-level
//! set is computed and cached under `Unit::member`. A member whose own set is
//! empty inherits the unit-level set wholesale; a member with at least one
//! tag relies only on its own rules.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{MemoryCache, RuleCache};
use crate::error::Result;
use crate::rules::RuleSet;
use crate::source::MetadataSource;
use crate::unit::UnitRef;

/// Turns annotation text into cached [`RuleSet`]s.
#[derive(Clone)]
pub struct Extractor {
    source: Arc<dyn MetadataSource>,
    cache: Arc<dyn RuleCache>,
}

impl Extractor {
    /// Creates an extractor backed by a fresh [`MemoryCache`].
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self::with_cache(source, Arc::new(MemoryCache::new()))
    }

    pub fn with_cache(source: Arc<dyn MetadataSource>, cache: Arc<dyn RuleCache>) -> Self {
        Self { source, cache }
    }

    /// Replaces the cache. Entries in the previous cache are not carried over.
    pub fn set_cache(&mut self, cache: Arc<dyn RuleCache>) -> &mut Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<dyn RuleCache> {
        &self.cache
    }

    /// Returns the effective rule set for `unit`, or for `unit::member`.
    ///
    /// # Errors
    ///
    /// [`crate::AuthError::LookupFailure`] when the source does not know the
    /// unit or member, and [`crate::AuthError::Cache`] when the cache cannot
    /// store a computed set. Nothing is cached for a failed lookup.
    pub fn extract(&self, unit: &UnitRef, member: Option<&str>) -> Result<Arc<RuleSet>> {
        let member = member.filter(|m| !m.is_empty());
        let unit_sig = unit.signature(None);

        let unit_rules = self.cached_or_compute(&unit_sig, || {
            self.source.unit_doc(unit.name())
        })?;

        let Some(member) = member else {
            return Ok(unit_rules);
        };

        let sig = unit.signature(Some(member));
        let member_rules = self.cached_or_compute(&sig, || {
            self.source.member_doc(unit.name(), member)
        })?;

        if member_rules.is_empty() {
            debug!(signature = %sig, "No member rules; inheriting unit rules");
            Ok(unit_rules)
        } else {
            Ok(member_rules)
        }
    }

    fn cached_or_compute<F>(&self, sig: &str, doc: F) -> Result<Arc<RuleSet>>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(rules) = self.cache.get(sig) {
            debug!(signature = %sig, "Rule cache hit");
            return Ok(rules);
        }

        let rules = Arc::new(RuleSet::from_doc(&doc()?));
        debug!(signature = %sig, rules = rules.len(), "Rule cache miss; parsed");
        self.cache.set(sig, Arc::clone(&rules))?;
        Ok(rules)
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}
