//! Calculators for each supported tax type.
//!
//! Every calculator borrows one section of a
//! [`JurisdictionRuleSet`](crate::JurisdictionRuleSet), takes typed inputs
//! and returns an [`Assessment`]. The [`ResultAssembler`] turns that into
//! the final [`CalculationResult`](crate::CalculationResult).

pub mod adjustments;
pub mod assembler;
pub mod brackets;
pub mod capital_gains;
pub mod common;
pub mod corporate_tax;
pub mod income_tax;
pub mod social_security;
pub mod stamp_duty;
pub mod vat;

pub use assembler::{Assessment, ResultAssembler};
pub use brackets::{BracketEvaluation, BracketEvaluator};
pub use capital_gains::CapitalGainsCalculator;
pub use corporate_tax::CorporateTaxCalculator;
pub use income_tax::IncomeTaxCalculator;
pub use social_security::SocialSecurityCalculator;
pub use stamp_duty::StampDutyCalculator;
pub use vat::VatCalculator;
