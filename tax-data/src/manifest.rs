use chrono::NaiveDate;
use serde::Deserialize;
use tax_core::{
    AdjustmentModel, Allowances, CapitalGainsRules, CorporateTaxRules, SocialSecurityRules,
    VatRules,
};

/// One rule-set version as written in a TOML manifest.
///
/// Bracket schedules are not part of the manifest; they come from
/// `brackets.csv`, keyed by jurisdiction and `effective_from`. A section
/// that is present enables its calculation type.
///
/// Amounts and rates are written as strings (`rate = "0.35"`) so they are
/// read exactly.
///
/// ```toml
/// jurisdiction = "MT"
/// effective_from = "2025-01-01"
/// currency = "EUR"
///
/// [corporate_tax]
/// model = "flat"
/// rate = "0.35"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetManifest {
    pub jurisdiction: String,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub currency: Option<String>,
    pub income_tax: Option<IncomeTaxManifest>,
    pub corporate_tax: Option<CorporateTaxRules>,
    pub vat: Option<VatRules>,
    pub social_security: Option<SocialSecurityRules>,
    pub stamp_duty: Option<StampDutyManifest>,
    pub capital_gains: Option<CapitalGainsRules>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomeTaxManifest {
    #[serde(default)]
    pub allowances: Allowances,
    pub adjustment: AdjustmentModel,
}

/// Enables stamp duty; the bands come from the bracket table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StampDutyManifest {}
