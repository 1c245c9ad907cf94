use std::sync::Arc;

use tracing::{debug, warn};

use crate::calculations::common::{checked_add, checked_sub, effective_rate, round_half_up};
use crate::calculations::{
    Assessment, CapitalGainsCalculator, CorporateTaxCalculator, IncomeTaxCalculator,
    ResultAssembler, SocialSecurityCalculator, StampDutyCalculator, VatCalculator,
};
use crate::error::CalculationError;
use crate::models::{
    CalculationInputs, CalculationRequest, CalculationResult, CombinedRequest, CombinedResult,
    JurisdictionRuleSet,
};
use crate::rules::RuleSetRepository;

/// Entry point for tax calculations.
///
/// Resolves the rule set in effect for the request's jurisdiction and date,
/// routes to the calculator for the requested type and assembles the
/// result. Calculations are pure; the engine can be shared freely between
/// threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
/// use tax_core::{
///     CalculationRequest, CorporateTaxInputs, CorporateTaxRules, JurisdictionRuleSet,
///     RuleSetRepository, TaxEngine,
/// };
///
/// let repository = RuleSetRepository::with_rule_sets([JurisdictionRuleSet {
///     corporate_tax: Some(CorporateTaxRules::Flat { rate: dec!(0.35) }),
///     ..JurisdictionRuleSet::new("MT", NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
/// }])
/// .unwrap();
/// let engine = TaxEngine::new(Arc::new(repository));
///
/// let request = CalculationRequest::new(
///     "MT",
///     NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
///     CorporateTaxInputs {
///         profit: dec!(100000),
///         deductible_expenses: dec!(0),
///         turnover: None,
///     },
/// );
///
/// let result = engine.calculate(&request).unwrap();
/// assert_eq!(result.total, dec!(35000.00));
/// assert_eq!(result.effective_rate, dec!(0.35));
/// ```
#[derive(Debug, Clone)]
pub struct TaxEngine {
    repository: Arc<RuleSetRepository>,
}

impl TaxEngine {
    pub fn new(repository: Arc<RuleSetRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &RuleSetRepository {
        &self.repository
    }

    /// Runs one calculation.
    ///
    /// # Errors
    ///
    /// - [`CalculationError::RuleSetNotFound`] when no rule set covers the
    ///   jurisdiction and date
    /// - [`CalculationError::UnsupportedCalculationType`] when the rule set
    ///   has no parameters for the requested type
    /// - [`CalculationError::InvalidInput`] and the other variants from the
    ///   calculators
    pub fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationResult, CalculationError> {
        let result = self
            .repository
            .resolve(&request.jurisdiction_code, request.as_of_date)
            .and_then(|rule_set| calculate_with(&rule_set, request));

        if let Err(err) = &result {
            warn!(
                jurisdiction = %request.jurisdiction_code,
                calculation_type = %request.calculation_type(),
                as_of_date = %request.as_of_date,
                error = %err,
                "calculation failed"
            );
        }
        result
    }

    /// Income tax and social security for one person, both against the
    /// rule set in effect for the request's jurisdiction and date.
    ///
    /// # Errors
    ///
    /// As [`TaxEngine::calculate`]; the first failing part is reported and
    /// no partial result is returned.
    pub fn calculate_combined(
        &self,
        request: &CombinedRequest,
    ) -> Result<CombinedResult, CalculationError> {
        let result = self
            .repository
            .resolve(&request.jurisdiction_code, request.as_of_date)
            .and_then(|rule_set| combine(&rule_set, request));

        if let Err(err) = &result {
            warn!(
                jurisdiction = %request.jurisdiction_code,
                as_of_date = %request.as_of_date,
                error = %err,
                "combined calculation failed"
            );
        }
        result
    }
}

fn combine(
    rule_set: &JurisdictionRuleSet,
    request: &CombinedRequest,
) -> Result<CombinedResult, CalculationError> {
    let income_tax = calculate_with(rule_set, &request.income_tax_request())?;
    let social_security = calculate_with(rule_set, &request.social_security_request())?;

    let gross_income = request.income_tax.gross_income;
    let total_liability = round_half_up(checked_add(
        income_tax.total,
        social_security.total,
        "total liability",
    )?);
    let net_income = round_half_up(checked_sub(gross_income, total_liability, "net income")?);
    let effective_rate = effective_rate(total_liability, gross_income)?;

    debug!(%total_liability, %net_income, %effective_rate, "combined calculation complete");
    Ok(CombinedResult {
        income_tax,
        social_security,
        total_liability,
        net_income,
        effective_rate,
    })
}

/// Runs `request` against an already resolved rule set.
///
/// # Errors
///
/// As [`TaxEngine::calculate`], except that the rule set is never looked up.
pub fn calculate_with(
    rule_set: &JurisdictionRuleSet,
    request: &CalculationRequest,
) -> Result<CalculationResult, CalculationError> {
    let calculation_type = request.calculation_type();
    let unsupported = || CalculationError::UnsupportedCalculationType {
        jurisdiction: rule_set.jurisdiction_code.clone(),
        calculation_type,
    };

    debug!(
        jurisdiction = %rule_set.jurisdiction_code,
        effective_from = %rule_set.effective_from,
        %calculation_type,
        "dispatching calculation"
    );

    let assessment: Assessment = match &request.inputs {
        CalculationInputs::IncomeTax(inputs) => {
            let rules = rule_set.income_tax.as_ref().ok_or_else(unsupported)?;
            IncomeTaxCalculator::new(rules).calculate(inputs)?
        }
        CalculationInputs::CorporateTax(inputs) => {
            let rules = rule_set.corporate_tax.as_ref().ok_or_else(unsupported)?;
            CorporateTaxCalculator::new(rules).calculate(inputs)?
        }
        CalculationInputs::Vat(inputs) => {
            let rules = rule_set.vat.as_ref().ok_or_else(unsupported)?;
            VatCalculator::new(rules).calculate(inputs)?
        }
        CalculationInputs::SocialSecurity(inputs) => {
            let rules = rule_set.social_security.as_ref().ok_or_else(unsupported)?;
            SocialSecurityCalculator::new(rules).calculate(inputs)?
        }
        CalculationInputs::StampDuty(inputs) => {
            let rules = rule_set.stamp_duty.as_ref().ok_or_else(unsupported)?;
            StampDutyCalculator::new(rules).calculate(inputs)?
        }
        CalculationInputs::CapitalGains(inputs) => {
            let rules = rule_set.capital_gains.as_ref().ok_or_else(unsupported)?;
            CapitalGainsCalculator::new(rules).calculate(inputs)?
        }
    };

    let result = ResultAssembler::new(rule_set, request).assemble(assessment)?;
    debug!(total = %result.total, effective_rate = %result.effective_rate, "calculation complete");
    Ok(result)
}
