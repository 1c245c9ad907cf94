use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{CalculationRequest, CalculationResult, IncomeTaxInputs, SocialSecurityInputs};

/// Income tax and social security for one person, settled against a
/// single rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedRequest {
    pub jurisdiction_code: String,
    pub as_of_date: NaiveDate,
    pub income_tax: IncomeTaxInputs,
    pub social_security: SocialSecurityInputs,
}

impl CombinedRequest {
    pub fn new(
        jurisdiction_code: impl Into<String>,
        as_of_date: NaiveDate,
        income_tax: IncomeTaxInputs,
        social_security: SocialSecurityInputs,
    ) -> Self {
        Self {
            jurisdiction_code: jurisdiction_code.into(),
            as_of_date,
            income_tax,
            social_security,
        }
    }

    pub fn income_tax_request(&self) -> CalculationRequest {
        CalculationRequest::new(
            self.jurisdiction_code.clone(),
            self.as_of_date,
            self.income_tax.clone(),
        )
    }

    pub fn social_security_request(&self) -> CalculationRequest {
        CalculationRequest::new(
            self.jurisdiction_code.clone(),
            self.as_of_date,
            self.social_security.clone(),
        )
    }
}

/// Both results plus the household view of them.
///
/// `net_income` is gross income less `total_liability`; `effective_rate`
/// is `total_liability / gross_income`, zero when there is no income.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub income_tax: CalculationResult,
    pub social_security: CalculationResult,
    pub total_liability: Decimal,
    pub net_income: Decimal,
    pub effective_rate: Decimal,
}
