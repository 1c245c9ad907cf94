use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{info, warn};

use super::source::{RuleSetSource, RuleSetSourceError};
use crate::error::{CalculationError, RuleSetError};
use crate::models::JurisdictionRuleSet;

/// An immutable, indexed set of published rule sets.
///
/// Rule sets live in an append-only arena; `versions` maps each
/// jurisdiction code to its arena slots ordered by `effective_from`.
#[derive(Debug, Clone, Default)]
pub struct RuleSetIndex {
    arena: Vec<Arc<JurisdictionRuleSet>>,
    versions: HashMap<String, Vec<usize>>,
}

impl RuleSetIndex {
    /// Builds an index from rule sets, rejecting the first invalid or
    /// overlapping one.
    pub fn build(
        rule_sets: impl IntoIterator<Item = JurisdictionRuleSet>
    ) -> Result<Self, RuleSetError> {
        let mut index = Self::default();
        for rule_set in rule_sets {
            index.insert(rule_set)?;
        }
        Ok(index)
    }

    fn insert(
        &mut self,
        mut rule_set: JurisdictionRuleSet,
    ) -> Result<Arc<JurisdictionRuleSet>, RuleSetError> {
        rule_set.validate()?;
        rule_set.jurisdiction_code = JurisdictionRuleSet::normalize_code(&rule_set.jurisdiction_code)?;

        let slots = self
            .versions
            .get(&rule_set.jurisdiction_code)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if let Some(existing) = slots
            .iter()
            .map(|&slot| &self.arena[slot])
            .find(|existing| existing.overlaps(&rule_set))
        {
            return Err(RuleSetError::OverlappingVersion {
                jurisdiction: rule_set.jurisdiction_code.clone(),
                effective_from: rule_set.effective_from,
                existing_from: existing.effective_from,
            });
        }

        let slot = self.arena.len();
        let rule_set = Arc::new(rule_set);
        self.arena.push(Arc::clone(&rule_set));

        let arena = &self.arena;
        let slots = self
            .versions
            .entry(rule_set.jurisdiction_code.clone())
            .or_default();
        slots.push(slot);
        slots.sort_by_key(|&slot| arena[slot].effective_from);

        Ok(rule_set)
    }

    /// The version of `code` in effect on `date`.
    pub fn resolve(
        &self,
        code: &str,
        date: NaiveDate,
    ) -> Option<Arc<JurisdictionRuleSet>> {
        let code = JurisdictionRuleSet::normalize_code(code).ok()?;
        self.versions
            .get(&code)?
            .iter()
            .rev()
            .map(|&slot| &self.arena[slot])
            .find(|rule_set| rule_set.is_effective_on(date))
            .cloned()
    }

    /// Every version of `code`, oldest first.
    pub fn versions(
        &self,
        code: &str,
    ) -> Vec<Arc<JurisdictionRuleSet>> {
        let Ok(code) = JurisdictionRuleSet::normalize_code(code) else {
            return Vec::new();
        };
        self.versions
            .get(&code)
            .map(|slots| slots.iter().map(|&slot| Arc::clone(&self.arena[slot])).collect())
            .unwrap_or_default()
    }

    /// Known jurisdiction codes, sorted.
    pub fn jurisdictions(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.versions.keys().cloned().collect();
        codes.sort_unstable();
        codes
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

/// Thread-safe store of [`JurisdictionRuleSet`]s, versioned by effective
/// date.
///
/// Readers take a cheap [`Arc`] snapshot of the current index and never
/// block each other. Writers build a new index off to the side and swap it
/// in, so a reader sees either the old or the new set of rule sets, never a
/// mix.
#[derive(Debug, Default)]
pub struct RuleSetRepository {
    index: RwLock<Arc<RuleSetIndex>>,
}

impl RuleSetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository pre-loaded with `rule_sets`.
    ///
    /// # Errors
    ///
    /// Returns the first validation or overlap error.
    pub fn with_rule_sets(
        rule_sets: impl IntoIterator<Item = JurisdictionRuleSet>
    ) -> Result<Self, RuleSetError> {
        let index = RuleSetIndex::build(rule_sets)?;
        Ok(Self {
            index: RwLock::new(Arc::new(index)),
        })
    }

    /// The current index. Later publishes do not affect it.
    pub fn snapshot(&self) -> Arc<RuleSetIndex> {
        Arc::clone(&self.index.read())
    }

    /// Adds one rule set version.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] if the rule set is invalid or its effective
    /// period overlaps an existing version of the same jurisdiction. The
    /// repository is unchanged on error.
    pub fn publish(
        &self,
        rule_set: JurisdictionRuleSet,
    ) -> Result<Arc<JurisdictionRuleSet>, RuleSetError> {
        let mut guard = self.index.write();
        let mut next = RuleSetIndex::clone(&guard);
        let published = next.insert(rule_set).inspect_err(|err| {
            warn!(error = %err, "rejected rule set");
        })?;
        *guard = Arc::new(next);

        info!(
            jurisdiction = %published.jurisdiction_code,
            effective_from = %published.effective_from,
            "published rule set"
        );
        Ok(published)
    }

    /// Replaces every rule set at once.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] for the first invalid or overlapping rule
    /// set; the previous rule sets stay in place.
    pub fn replace_all(
        &self,
        rule_sets: impl IntoIterator<Item = JurisdictionRuleSet>,
    ) -> Result<usize, RuleSetError> {
        let next = RuleSetIndex::build(rule_sets).inspect_err(|err| {
            warn!(error = %err, "rejected rule set replacement");
        })?;
        let count = next.len();
        *self.index.write() = Arc::new(next);

        info!(rule_sets = count, "replaced rule sets");
        Ok(count)
    }

    /// Loads every rule set from `source` and replaces the current ones.
    pub fn reload_from(
        &self,
        source: &dyn RuleSetSource,
    ) -> Result<usize, RuleSetSourceError> {
        let rule_sets = source.load()?;
        info!(source = %source.name(), "reloading rule sets");
        Ok(self.replace_all(rule_sets)?)
    }

    /// The version of `code` in effect on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::RuleSetNotFound`] when no version covers
    /// the date.
    pub fn resolve(
        &self,
        code: &str,
        date: NaiveDate,
    ) -> Result<Arc<JurisdictionRuleSet>, CalculationError> {
        self.snapshot()
            .resolve(code, date)
            .ok_or_else(|| CalculationError::RuleSetNotFound {
                jurisdiction: code.to_string(),
                as_of_date: date,
            })
    }

    pub fn versions(
        &self,
        code: &str,
    ) -> Vec<Arc<JurisdictionRuleSet>> {
        self.snapshot().versions(code)
    }

    pub fn jurisdictions(&self) -> Vec<String> {
        self.snapshot().jurisdictions()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
