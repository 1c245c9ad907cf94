use thiserror::Error;

use crate::error::RuleSetError;
use crate::models::JurisdictionRuleSet;

#[derive(Debug, Error)]
pub enum RuleSetSourceError {
    #[error("failed to load rule sets from {source_name}: {error}")]
    Load {
        source_name: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Invalid(#[from] RuleSetError),
}

/// Somewhere rule sets can be loaded from, e.g. a directory of manifests.
///
/// Implementations return every rule set they hold; the
/// [`RuleSetRepository`](super::RuleSetRepository) validates them and
/// swaps them in as one snapshot.
pub trait RuleSetSource: Send + Sync {
    /// Human-readable location, used in logs and errors.
    fn name(&self) -> String;

    fn load(&self) -> Result<Vec<JurisdictionRuleSet>, RuleSetSourceError>;
}

/// A fixed list of rule sets held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    rule_sets: Vec<JurisdictionRuleSet>,
}

impl StaticSource {
    pub fn new(rule_sets: Vec<JurisdictionRuleSet>) -> Self {
        Self { rule_sets }
    }
}

impl RuleSetSource for StaticSource {
    fn name(&self) -> String {
        "static".to_string()
    }

    fn load(&self) -> Result<Vec<JurisdictionRuleSet>, RuleSetSourceError> {
        Ok(self.rule_sets.clone())
    }
}
