use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CalculationError, RuleSetError};
use crate::models::{BracketSchedule, CalculationType, MaritalStatus};

/// The fiscal parameters of one jurisdiction for one effective period.
///
/// Identified by `(jurisdiction_code, effective_from)`. The period is the
/// half-open range `[effective_from, effective_to)`; a missing
/// `effective_to` means the rule set stays in effect until superseded.
///
/// Each optional section enables one calculation type. A rule set is
/// immutable once published to a
/// [`RuleSetRepository`](crate::rules::RuleSetRepository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionRuleSet {
    pub jurisdiction_code: String,
    pub effective_from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_tax: Option<IncomeTaxRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corporate_tax: Option<CorporateTaxRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<VatRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_security: Option<SocialSecurityRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stamp_duty: Option<StampDutyRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_gains: Option<CapitalGainsRules>,
}

impl JurisdictionRuleSet {
    /// An empty rule set supporting no calculation type yet.
    pub fn new(
        jurisdiction_code: impl Into<String>,
        effective_from: NaiveDate,
    ) -> Self {
        Self {
            jurisdiction_code: jurisdiction_code.into(),
            effective_from,
            effective_to: None,
            currency: None,
            income_tax: None,
            corporate_tax: None,
            vat: None,
            social_security: None,
            stamp_duty: None,
            capital_gains: None,
        }
    }

    /// Uppercases and checks a jurisdiction code.
    pub fn normalize_code(code: &str) -> Result<String, RuleSetError> {
        let trimmed = code.trim();
        let valid = (2..=8).contains(&trimmed.len())
            && trimmed.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid {
            return Err(RuleSetError::InvalidJurisdictionCode(code.to_string()));
        }
        Ok(trimmed.to_ascii_uppercase())
    }

    pub fn is_effective_on(
        &self,
        date: NaiveDate,
    ) -> bool {
        date >= self.effective_from && self.effective_to.is_none_or(|to| date < to)
    }

    /// Whether the effective periods of two rule sets share any day.
    pub fn overlaps(
        &self,
        other: &JurisdictionRuleSet,
    ) -> bool {
        let starts_before_other_ends = other.effective_to.is_none_or(|to| self.effective_from < to);
        let other_starts_before_self_ends =
            self.effective_to.is_none_or(|to| other.effective_from < to);
        starts_before_other_ends && other_starts_before_self_ends
    }

    pub fn supports(
        &self,
        calculation_type: CalculationType,
    ) -> bool {
        match calculation_type {
            CalculationType::IncomeTax => self.income_tax.is_some(),
            CalculationType::CorporateTax => self.corporate_tax.is_some(),
            CalculationType::Vat => self.vat.is_some(),
            CalculationType::SocialSecurity => self.social_security.is_some(),
            CalculationType::StampDuty => self.stamp_duty.is_some(),
            CalculationType::CapitalGains => self.capital_gains.is_some(),
        }
    }

    pub fn supported_calculations(&self) -> Vec<CalculationType> {
        CalculationType::ALL
            .into_iter()
            .filter(|t| self.supports(*t))
            .collect()
    }

    /// Checks every invariant not already enforced by [`BracketSchedule`].
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleSetError`] found.
    pub fn validate(&self) -> Result<(), RuleSetError> {
        Self::normalize_code(&self.jurisdiction_code)?;

        if let Some(to) = self.effective_to {
            if self.effective_from >= to {
                return Err(RuleSetError::InvalidEffectiveRange {
                    from: self.effective_from,
                    to,
                });
            }
        }

        if let Some(income_tax) = &self.income_tax {
            income_tax.validate()?;
        }
        if let Some(corporate_tax) = &self.corporate_tax {
            corporate_tax.validate()?;
        }
        if let Some(vat) = &self.vat {
            vat.validate()?;
        }
        if let Some(social_security) = &self.social_security {
            social_security.validate()?;
        }
        if let Some(capital_gains) = &self.capital_gains {
            capital_gains.validate()?;
        }
        Ok(())
    }
}

fn check_rate(
    field: &str,
    rate: Decimal,
) -> Result<(), RuleSetError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(RuleSetError::RateOutOfRange {
            field: field.to_string(),
            rate,
        });
    }
    Ok(())
}

fn check_amount(
    field: &str,
    amount: Decimal,
) -> Result<(), RuleSetError> {
    if amount < Decimal::ZERO {
        return Err(RuleSetError::NegativeAmount {
            field: field.to_string(),
            amount,
        });
    }
    Ok(())
}

fn check_positive(
    field: &str,
    value: Decimal,
) -> Result<(), RuleSetError> {
    if value <= Decimal::ZERO {
        return Err(RuleSetError::NonPositive {
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}

fn check_caps(
    field: &str,
    minimum: Option<Decimal>,
    maximum: Option<Decimal>,
) -> Result<(), RuleSetError> {
    if let Some(minimum) = minimum {
        check_amount(&format!("{field}.minimum"), minimum)?;
    }
    if let Some(maximum) = maximum {
        check_amount(&format!("{field}.maximum"), maximum)?;
    }
    if let (Some(minimum), Some(maximum)) = (minimum, maximum) {
        if minimum > maximum {
            return Err(RuleSetError::InvertedCaps {
                field: field.to_string(),
                minimum,
                maximum,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Income tax
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxRules {
    pub single: BracketSchedule,
    /// Distinct joint schedule; married taxpayers fall back to `single`
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub married: Option<BracketSchedule>,
    #[serde(default)]
    pub allowances: Allowances,
    pub adjustment: AdjustmentModel,
}

impl IncomeTaxRules {
    pub fn schedule_for(
        &self,
        status: MaritalStatus,
    ) -> &BracketSchedule {
        match (&self.married, status.is_married()) {
            (Some(married), true) => married,
            _ => &self.single,
        }
    }

    fn validate(&self) -> Result<(), RuleSetError> {
        check_amount("income_tax.allowances.personal", self.allowances.personal)?;
        check_amount("income_tax.allowances.married", self.allowances.married)?;
        check_amount(
            "income_tax.allowances.per_dependent",
            self.allowances.per_dependent,
        )?;
        if let AdjustmentModel::FamilyQuotient(parts) = &self.adjustment {
            check_positive("income_tax.adjustment.base", parts.base)?;
            check_amount("income_tax.adjustment.married", parts.married)?;
            check_amount("income_tax.adjustment.per_dependent", parts.per_dependent)?;
        }
        Ok(())
    }
}

/// Fixed amounts subtracted from the bracket tax under
/// [`AdjustmentModel::FlatAllowance`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allowances {
    pub personal: Decimal,
    pub married: Decimal,
    pub per_dependent: Decimal,
}

/// How the raw bracket result is turned into the household's income tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum AdjustmentModel {
    /// `max(0, raw - personal - married? - dependents * per_dependent)`.
    FlatAllowance,
    /// Brackets are evaluated on `base / parts` and the tax multiplied back
    /// by `parts`.
    FamilyQuotient(QuotientParts),
}

impl AdjustmentModel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::FlatAllowance => "flat_allowance",
            Self::FamilyQuotient(_) => "family_quotient",
        }
    }
}

/// Household part counts for [`AdjustmentModel::FamilyQuotient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotientParts {
    pub base: Decimal,
    pub married: Decimal,
    pub per_dependent: Decimal,
}

impl Default for QuotientParts {
    fn default() -> Self {
        Self {
            base: Decimal::ONE,
            married: Decimal::ONE,
            per_dependent: Decimal::new(5, 1),
        }
    }
}

// =============================================================================
// Corporate tax
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum CorporateTaxRules {
    Flat {
        rate: Decimal,
    },
    /// Profit up to `threshold` is taxed at `reduced_rate`, the rest at
    /// `standard_rate`. Companies with turnover above `max_turnover` pay
    /// the standard rate on everything.
    ThresholdReducedRate {
        standard_rate: Decimal,
        reduced_rate: Decimal,
        threshold: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_turnover: Option<Decimal>,
    },
}

impl CorporateTaxRules {
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Flat { .. } => "flat",
            Self::ThresholdReducedRate { .. } => "threshold_reduced_rate",
        }
    }

    fn validate(&self) -> Result<(), RuleSetError> {
        match self {
            Self::Flat { rate } => check_rate("corporate_tax.rate", *rate),
            Self::ThresholdReducedRate {
                standard_rate,
                reduced_rate,
                threshold,
                max_turnover,
            } => {
                check_rate("corporate_tax.standard_rate", *standard_rate)?;
                check_rate("corporate_tax.reduced_rate", *reduced_rate)?;
                check_positive("corporate_tax.threshold", *threshold)?;
                if let Some(max_turnover) = max_turnover {
                    check_positive("corporate_tax.max_turnover", *max_turnover)?;
                }
                Ok(())
            }
        }
    }
}

// =============================================================================
// VAT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatRules {
    pub standard: Decimal,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reduced: Vec<NamedRate>,
    #[serde(default)]
    pub zero_rated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRate {
    pub name: String,
    pub rate: Decimal,
}

impl VatRules {
    pub fn rate_for(
        &self,
        category: &VatRateCategory,
    ) -> Option<Decimal> {
        match category {
            VatRateCategory::Standard => Some(self.standard),
            VatRateCategory::Zero => self.zero_rated.then_some(Decimal::ZERO),
            VatRateCategory::Reduced(name) => self
                .reduced
                .iter()
                .find(|named| &named.name == name)
                .map(|named| named.rate),
        }
    }

    fn validate(&self) -> Result<(), RuleSetError> {
        check_rate("vat.standard", self.standard)?;
        let mut seen = HashSet::new();
        for named in &self.reduced {
            match VatRateCategory::parse(&named.name) {
                Ok(VatRateCategory::Reduced(_)) => {}
                _ => return Err(RuleSetError::InvalidRateCategory(named.name.clone())),
            }
            if !seen.insert(&named.name) {
                return Err(RuleSetError::DuplicateRateCategory(named.name.clone()));
            }
            check_rate(&format!("vat.reduced.{}", named.name), named.rate)?;
        }
        Ok(())
    }
}

/// A VAT rate category as named in a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VatRateCategory {
    Standard,
    Zero,
    Reduced(String),
}

impl VatRateCategory {
    /// Parses `standard`, `zero`, or a reduced-rate name made of lowercase
    /// letters, digits and underscores.
    pub fn parse(s: &str) -> Result<Self, CalculationError> {
        match s {
            "standard" => Ok(Self::Standard),
            "zero" => Ok(Self::Zero),
            name if !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') =>
            {
                Ok(Self::Reduced(name.to_string()))
            }
            other => Err(CalculationError::invalid(
                "rate_category",
                format!("'{other}' is not a valid rate category name"),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "standard",
            Self::Zero => "zero",
            Self::Reduced(name) => name,
        }
    }
}

// =============================================================================
// Social security
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurityRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee: Option<ContributionSchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_employed: Option<ContributionSchedule>,
}

impl SocialSecurityRules {
    pub fn schedule_for(
        &self,
        class: ContributionClass,
    ) -> Option<&ContributionSchedule> {
        match class {
            ContributionClass::Employee => self.employee.as_ref(),
            ContributionClass::SelfEmployed => self.self_employed.as_ref(),
        }
    }

    fn validate(&self) -> Result<(), RuleSetError> {
        if let Some(employee) = &self.employee {
            employee.validate("social_security.employee")?;
        }
        if let Some(self_employed) = &self.self_employed {
            self_employed.validate("social_security.self_employed")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionClass {
    Employee,
    SelfEmployed,
}

impl ContributionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::SelfEmployed => "self_employed",
        }
    }
}

/// The period a contribution base and its caps are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionPeriod {
    Weekly,
    Monthly,
    Annual,
}

impl ContributionPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }

    /// Most periods of this length that fit in one contribution year.
    pub fn max_periods(&self) -> u32 {
        match self {
            Self::Weekly => 53,
            Self::Monthly => 12,
            Self::Annual => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSchedule {
    pub period: ContributionPeriod,
    pub rate: Decimal,
    #[serde(default)]
    pub employer_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Decimal>,
    /// Cap overrides by year of birth, checked in ascending
    /// `born_on_or_before` order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cohorts: Vec<BirthCohortCaps>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthCohortCaps {
    pub born_on_or_before: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Decimal>,
}

/// Periodic contribution floor and ceiling after cohort overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionCaps {
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
}

impl ContributionSchedule {
    pub fn caps_for(
        &self,
        birth_year: Option<i32>,
    ) -> ContributionCaps {
        let cohort = birth_year.and_then(|year| {
            self.cohorts
                .iter()
                .filter(|cohort| year <= cohort.born_on_or_before)
                .min_by_key(|cohort| cohort.born_on_or_before)
        });
        ContributionCaps {
            minimum: cohort.and_then(|c| c.minimum).or(self.minimum),
            maximum: cohort.and_then(|c| c.maximum).or(self.maximum),
        }
    }

    fn validate(
        &self,
        field: &str,
    ) -> Result<(), RuleSetError> {
        check_rate(&format!("{field}.rate"), self.rate)?;
        check_rate(&format!("{field}.employer_rate"), self.employer_rate)?;
        check_caps(field, self.minimum, self.maximum)?;
        for cohort in &self.cohorts {
            let caps = self.caps_for(Some(cohort.born_on_or_before));
            check_caps(
                &format!("{field}.cohorts[{}]", cohort.born_on_or_before),
                caps.minimum,
                caps.maximum,
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Stamp duty and capital gains
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampDutyRules {
    pub general: BracketSchedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_time_buyer: Option<BracketSchedule>,
}

impl StampDutyRules {
    /// The first-time-buyer bands when asked for and defined, else the
    /// general bands.
    pub fn schedule_for(
        &self,
        is_first_time_buyer: bool,
    ) -> (&BracketSchedule, bool) {
        match (&self.first_time_buyer, is_first_time_buyer) {
            (Some(first_time_buyer), true) => (first_time_buyer, true),
            _ => (&self.general, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsRules {
    pub short_term_rate: Decimal,
    pub long_term_rate: Decimal,
    /// Whole calendar years an asset must be held for `long_term_rate`.
    pub long_term_after_years: u32,
}

impl CapitalGainsRules {
    fn validate(&self) -> Result<(), RuleSetError> {
        check_rate("capital_gains.short_term_rate", self.short_term_rate)?;
        check_rate("capital_gains.long_term_rate", self.long_term_rate)
    }
}
