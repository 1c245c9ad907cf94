//! Multi-jurisdiction progressive tax calculation.
//!
//! Rule sets describe one jurisdiction's fiscal parameters for one effective
//! period and are published to a [`RuleSetRepository`]. The [`TaxEngine`]
//! resolves the rule set in effect for a [`CalculationRequest`] and returns
//! a [`CalculationResult`] with a bracket-by-bracket breakdown.

pub mod calculations;
pub mod engine;
pub mod error;
pub mod models;
pub mod rules;

pub use engine::{TaxEngine, calculate_with};
pub use error::{CalculationError, RuleSetError};
pub use models::*;
pub use rules::{RuleSetIndex, RuleSetRepository, RuleSetSource, RuleSetSourceError, StaticSource};

#[cfg(test)]
mod proptests;
