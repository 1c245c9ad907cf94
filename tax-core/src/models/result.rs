use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CalculationType, TaxBracket};

/// The outcome of a calculation, with an audit breakdown in bracket order.
///
/// Bracket lines come first. When allowances, credits, a ceiling or a
/// floor changed the bracket result, one closing line of the matching
/// [`ContributionKind`] carries `-adjustments_applied`, so
/// `total == sum(breakdown.contribution_amount)` holds exactly.
/// `adjustments_applied` is negative when a statutory minimum raised the
/// amount above the bracket result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub total: Decimal,
    pub breakdown: Vec<BracketContribution>,
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
    pub adjustments_applied: Decimal,
    pub metadata: CalculationMetadata,
}

impl CalculationResult {
    /// Sum of the bracket lines, before adjustments.
    pub fn gross_amount(&self) -> Decimal {
        self.breakdown
            .iter()
            .filter(|c| c.kind == ContributionKind::Bracket)
            .map(|c| c.contribution_amount)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketContribution {
    #[serde(default, skip_serializing_if = "ContributionKind::is_bracket")]
    pub kind: ContributionKind,
    pub range: BracketRange,
    pub rate: Decimal,
    pub taxable_amount: Decimal,
    pub contribution_amount: Decimal,
}

/// What a breakdown line stands for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    /// A rate applied to one slice of the base.
    #[default]
    Bracket,
    /// Allowances and tax credits taken off the bracket result.
    Relief,
    /// The part of the bracket result above a contribution ceiling.
    Cap,
    /// The top-up that raises a contribution to its floor.
    Minimum,
}

impl ContributionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bracket => "bracket",
            Self::Relief => "relief",
            Self::Cap => "cap",
            Self::Minimum => "minimum",
        }
    }

    pub fn is_bracket(&self) -> bool {
        *self == Self::Bracket
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRange {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
}

impl From<&TaxBracket> for BracketRange {
    fn from(bracket: &TaxBracket) -> Self {
        Self {
            lower_bound: bracket.lower_bound,
            upper_bound: bracket.upper_bound,
        }
    }
}

/// Where a result came from and the figures around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationMetadata {
    pub jurisdiction_code: String,
    pub calculation_type: CalculationType,
    pub as_of_date: NaiveDate,
    pub rule_set_effective_from: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_set_effective_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Amount the effective rate is measured against.
    pub base: Decimal,
    /// Amount the brackets were applied to, after deductions.
    pub taxable_base: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotient_parts: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employer_contribution: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods: Option<u32>,
}
