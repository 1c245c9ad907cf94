//! Value added tax on a single amount.
//!
//! For a net amount the VAT is `round_half_up(net * rate)`. For a
//! VAT-inclusive amount the tax is extracted as
//! `round_half_up(gross - gross / (1 + rate))` and the net is what remains,
//! so `net + vat == gross` holds to the cent either way.

use rust_decimal::Decimal;

use crate::calculations::assembler::{Assessment, flat_line};
use crate::calculations::common::{checked_add, checked_div, checked_mul, checked_sub, round_half_up};
use crate::error::CalculationError;
use crate::models::{VatInputs, VatRateCategory, VatRules};

#[derive(Debug, Clone, Copy)]
pub struct VatCalculator<'a> {
    rules: &'a VatRules,
}

impl<'a> VatCalculator<'a> {
    pub fn new(rules: &'a VatRules) -> Self {
        Self { rules }
    }

    /// # Errors
    ///
    /// - [`CalculationError::InvalidInput`] for a negative amount or a
    ///   malformed category name
    /// - [`CalculationError::UnsupportedRateCategory`] when the category is
    ///   not defined by the rules
    pub fn calculate(
        &self,
        inputs: &VatInputs,
    ) -> Result<Assessment, CalculationError> {
        CalculationError::ensure_non_negative("amount", inputs.amount)?;
        let category = VatRateCategory::parse(inputs.rate_category.trim())?;
        let rate = self
            .rules
            .rate_for(&category)
            .ok_or_else(|| CalculationError::UnsupportedRateCategory(category.as_str().to_string()))?;

        let (net, vat, gross) = if inputs.includes_vat {
            let divisor = checked_add(Decimal::ONE, rate, "VAT divisor")?;
            let net = checked_div(inputs.amount, divisor, "net amount")?;
            let vat = round_half_up(checked_sub(inputs.amount, net, "VAT amount")?);
            (inputs.amount - vat, vat, inputs.amount)
        } else {
            let vat = round_half_up(checked_mul(inputs.amount, rate, "VAT amount")?);
            let gross = checked_add(inputs.amount, vat, "gross amount")?;
            (inputs.amount, vat, gross)
        };

        Ok(Assessment {
            base: net,
            taxable_base: net,
            breakdown: flat_line(net, rate, vat),
            marginal_rate: rate,
            schedule: Some(category.as_str().to_string()),
            net_amount: Some(net),
            gross_amount: Some(gross),
            ..Assessment::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::NamedRate;

    fn malta() -> VatRules {
        VatRules {
            standard: dec!(0.18),
            reduced: vec![
                NamedRate {
                    name: "reduced_1".to_string(),
                    rate: dec!(0.12),
                },
                NamedRate {
                    name: "reduced_2".to_string(),
                    rate: dec!(0.07),
                },
                NamedRate {
                    name: "reduced_3".to_string(),
                    rate: dec!(0.05),
                },
            ],
            zero_rated: true,
        }
    }

    fn inputs(
        amount: Decimal,
        rate_category: &str,
        includes_vat: bool,
    ) -> VatInputs {
        VatInputs {
            amount,
            rate_category: rate_category.to_string(),
            includes_vat,
        }
    }

    fn vat(assessment: &Assessment) -> Decimal {
        assessment.breakdown.iter().map(|c| c.contribution_amount).sum()
    }

    #[test]
    fn standard_rate_on_net_amount() {
        let rules = malta();

        let result = VatCalculator::new(&rules)
            .calculate(&inputs(dec!(100.00), "standard", false))
            .unwrap();

        assert_eq!(vat(&result), dec!(18.00));
        assert_eq!(result.net_amount, Some(dec!(100.00)));
        assert_eq!(result.gross_amount, Some(dec!(118.00)));
        assert_eq!(result.marginal_rate, dec!(0.18));
    }

    #[test]
    fn reduced_rate_by_name() {
        let rules = malta();

        let result = VatCalculator::new(&rules)
            .calculate(&inputs(dec!(100.00), "reduced_2", false))
            .unwrap();

        assert_eq!(vat(&result), dec!(7.00));
    }

    #[test]
    fn inclusive_amount_extracts_vat() {
        let rules = malta();

        let result = VatCalculator::new(&rules)
            .calculate(&inputs(dec!(118.00), "standard", true))
            .unwrap();

        assert_eq!(vat(&result), dec!(18.00));
        assert_eq!(result.net_amount, Some(dec!(100.00)));
        assert_eq!(result.gross_amount, Some(dec!(118.00)));
    }

    #[test]
    fn inclusive_amount_net_and_vat_add_up_to_gross() {
        let rules = malta();

        // 10 / 1.18 = 8.4745..., VAT 1.53
        let result = VatCalculator::new(&rules)
            .calculate(&inputs(dec!(10.00), "standard", true))
            .unwrap();

        assert_eq!(vat(&result), dec!(1.53));
        assert_eq!(result.net_amount, Some(dec!(8.47)));
    }

    #[test]
    fn zero_rate_when_zero_rated() {
        let rules = malta();

        let result = VatCalculator::new(&rules)
            .calculate(&inputs(dec!(250.00), "zero", false))
            .unwrap();

        assert_eq!(vat(&result), dec!(0.00));
        assert_eq!(result.gross_amount, Some(dec!(250.00)));
    }

    #[test]
    fn undefined_category_is_unsupported() {
        let rules = malta();

        let result = VatCalculator::new(&rules).calculate(&inputs(dec!(100), "reduced_9", false));

        assert_eq!(
            result,
            Err(CalculationError::UnsupportedRateCategory("reduced_9".to_string()))
        );
    }

    #[test]
    fn zero_category_is_unsupported_without_zero_rating() {
        let rules = VatRules {
            zero_rated: false,
            ..malta()
        };

        let result = VatCalculator::new(&rules).calculate(&inputs(dec!(100), "zero", false));

        assert_eq!(result, Err(CalculationError::UnsupportedRateCategory("zero".to_string())));
    }

    #[test]
    fn malformed_category_is_invalid_input() {
        let rules = malta();

        let result = VatCalculator::new(&rules).calculate(&inputs(dec!(100), "Reduced-1", false));

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput {
                field: "rate_category",
                ..
            })
        ));
    }

    #[test]
    fn zero_amount_has_empty_breakdown() {
        let rules = malta();

        let result = VatCalculator::new(&rules)
            .calculate(&inputs(dec!(0), "standard", false))
            .unwrap();

        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn overflowing_amount_reports_overflow() {
        let rules = malta();

        let result = VatCalculator::new(&rules).calculate(&inputs(Decimal::MAX, "standard", false));

        assert_eq!(result, Err(CalculationError::ArithmeticOverflow("gross amount")));
    }
}
