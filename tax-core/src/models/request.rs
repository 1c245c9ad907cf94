use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CalculationType, ContributionClass, MaritalStatus};

/// A single calculation asked of the engine.
///
/// Serialized as
/// `{ "jurisdiction_code", "as_of_date", "calculation_type", "inputs" }`
/// where the shape of `inputs` follows `calculation_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub jurisdiction_code: String,
    pub as_of_date: NaiveDate,
    #[serde(flatten)]
    pub inputs: CalculationInputs,
}

impl CalculationRequest {
    pub fn new(
        jurisdiction_code: impl Into<String>,
        as_of_date: NaiveDate,
        inputs: impl Into<CalculationInputs>,
    ) -> Self {
        Self {
            jurisdiction_code: jurisdiction_code.into(),
            as_of_date,
            inputs: inputs.into(),
        }
    }

    pub fn calculation_type(&self) -> CalculationType {
        self.inputs.calculation_type()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "calculation_type", content = "inputs", rename_all = "snake_case")]
pub enum CalculationInputs {
    IncomeTax(IncomeTaxInputs),
    CorporateTax(CorporateTaxInputs),
    Vat(VatInputs),
    SocialSecurity(SocialSecurityInputs),
    StampDuty(StampDutyInputs),
    CapitalGains(CapitalGainsInputs),
}

impl CalculationInputs {
    pub fn calculation_type(&self) -> CalculationType {
        match self {
            Self::IncomeTax(_) => CalculationType::IncomeTax,
            Self::CorporateTax(_) => CalculationType::CorporateTax,
            Self::Vat(_) => CalculationType::Vat,
            Self::SocialSecurity(_) => CalculationType::SocialSecurity,
            Self::StampDuty(_) => CalculationType::StampDuty,
            Self::CapitalGains(_) => CalculationType::CapitalGains,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeTaxInputs {
    pub gross_income: Decimal,
    #[serde(default)]
    pub marital_status: MaritalStatus,
    #[serde(default)]
    pub dependent_count: u32,
    /// Allowable deductions taken off gross income before the brackets.
    #[serde(default)]
    pub deductions: Decimal,
    /// Credits taken off the tax after allowances.
    #[serde(default)]
    pub tax_credits: Decimal,
}

impl IncomeTaxInputs {
    pub fn single(gross_income: Decimal) -> Self {
        Self {
            gross_income,
            marital_status: MaritalStatus::Single,
            dependent_count: 0,
            deductions: Decimal::ZERO,
            tax_credits: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporateTaxInputs {
    pub profit: Decimal,
    #[serde(default)]
    pub deductible_expenses: Decimal,
    /// Annual turnover, checked against a reduced-rate eligibility ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnover: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatInputs {
    /// Net amount, or the gross amount when `includes_vat` is set.
    #[serde(alias = "net_amount")]
    pub amount: Decimal,
    #[serde(default = "default_rate_category")]
    pub rate_category: String,
    #[serde(default)]
    pub includes_vat: bool,
}

fn default_rate_category() -> String {
    "standard".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurityInputs {
    pub class: ContributionClass,
    /// Weekly wage for employees, annual income for the self-employed, in
    /// the period of the jurisdiction's contribution schedule.
    #[serde(alias = "weekly_wage", alias = "annual_income")]
    pub base: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<i32>,
    /// Number of periods contributed, e.g. weeks worked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampDutyInputs {
    pub property_value: Decimal,
    #[serde(default)]
    pub is_first_time_buyer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsInputs {
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    pub purchase_date: NaiveDate,
    pub sale_date: NaiveDate,
    #[serde(default)]
    pub improvement_costs: Decimal,
    #[serde(default)]
    pub selling_costs: Decimal,
}

macro_rules! impl_into_inputs {
    ($($inputs:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$inputs> for CalculationInputs {
                fn from(inputs: $inputs) -> Self {
                    Self::$variant(inputs)
                }
            }
        )*
    };
}

impl_into_inputs! {
    IncomeTaxInputs => IncomeTax,
    CorporateTaxInputs => CorporateTax,
    VatInputs => Vat,
    SocialSecurityInputs => SocialSecurity,
    StampDutyInputs => StampDuty,
    CapitalGainsInputs => CapitalGains,
}
