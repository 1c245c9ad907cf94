mod calculation_type;
mod combined;
mod marital_status;
mod request;
mod result;
mod rule_set;
mod tax_bracket;

pub use calculation_type::CalculationType;
pub use combined::{CombinedRequest, CombinedResult};
pub use marital_status::MaritalStatus;
pub use request::{
    CalculationInputs, CalculationRequest, CapitalGainsInputs, CorporateTaxInputs,
    IncomeTaxInputs, SocialSecurityInputs, StampDutyInputs, VatInputs,
};
pub use result::{
    BracketContribution, BracketRange, CalculationMetadata, CalculationResult, ContributionKind,
};
pub use rule_set::{
    AdjustmentModel, Allowances, BirthCohortCaps, CapitalGainsRules, ContributionCaps,
    ContributionClass, ContributionPeriod, ContributionSchedule, CorporateTaxRules,
    IncomeTaxRules, JurisdictionRuleSet, NamedRate, QuotientParts, SocialSecurityRules,
    StampDutyRules, VatRateCategory, VatRules,
};
pub use tax_bracket::{BracketSchedule, TaxBracket};
