//! Social security contributions.
//!
//! The periodic contribution is `base * rate`, held between the schedule's
//! minimum and maximum (with birth-cohort overrides), then multiplied by
//! the number of periods. A zero base owes nothing; the minimum applies
//! only to periods with earnings.
//!
//! The breakdown shows the uncapped amount followed by a cap or minimum
//! line; the difference is reported as the adjustment, negative when the
//! minimum raised it.

use rust_decimal::Decimal;

use crate::calculations::assembler::{Assessment, flat_line};
use crate::calculations::common::{checked_mul, checked_sub, clamp, round_half_up};
use crate::error::CalculationError;
use crate::models::{
    ContributionCaps, ContributionKind, ContributionSchedule, SocialSecurityInputs,
    SocialSecurityRules,
};

#[derive(Debug, Clone, Copy)]
pub struct SocialSecurityCalculator<'a> {
    rules: &'a SocialSecurityRules,
}

impl<'a> SocialSecurityCalculator<'a> {
    pub fn new(rules: &'a SocialSecurityRules) -> Self {
        Self { rules }
    }

    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for a negative base, a
    /// period count outside `1..=max_periods`, or a contribution class the
    /// rules do not define.
    pub fn calculate(
        &self,
        inputs: &SocialSecurityInputs,
    ) -> Result<Assessment, CalculationError> {
        CalculationError::ensure_non_negative("base", inputs.base)?;
        let schedule = self.rules.schedule_for(inputs.class).ok_or_else(|| {
            CalculationError::invalid(
                "class",
                format!("no {} contribution schedule is defined", inputs.class.as_str()),
            )
        })?;
        let periods = Self::periods(schedule, inputs.periods)?;
        let caps = schedule.caps_for(inputs.birth_year);

        let uncapped = Self::contribution(inputs.base, schedule.rate, None, periods)?;
        let total = Self::contribution(inputs.base, schedule.rate, Some(caps), periods)?;
        let employer = if schedule.employer_rate.is_zero() {
            None
        } else {
            Some(Self::contribution(
                inputs.base,
                schedule.employer_rate,
                Some(caps),
                periods,
            )?)
        };

        let taxable = checked_mul(inputs.base, Decimal::from(periods), "contribution base")?;
        let adjustments = checked_sub(uncapped, total, "contribution cap")?;
        let adjustment_kind = if adjustments < Decimal::ZERO {
            ContributionKind::Minimum
        } else {
            ContributionKind::Cap
        };

        Ok(Assessment {
            base: taxable,
            taxable_base: taxable,
            breakdown: flat_line(taxable, schedule.rate, uncapped),
            adjustments,
            adjustment_kind: Some(adjustment_kind),
            marginal_rate: schedule.rate,
            model: Some(schedule.period.as_str()),
            schedule: Some(inputs.class.as_str().to_string()),
            employer_contribution: employer,
            periods: Some(periods),
            ..Assessment::default()
        })
    }

    fn periods(
        schedule: &ContributionSchedule,
        requested: Option<u32>,
    ) -> Result<u32, CalculationError> {
        let periods = requested.unwrap_or(1);
        let max_periods = schedule.period.max_periods();
        if !(1..=max_periods).contains(&periods) {
            return Err(CalculationError::invalid(
                "periods",
                format!(
                    "must be between 1 and {max_periods} for a {} schedule, got {periods}",
                    schedule.period.as_str()
                ),
            ));
        }
        Ok(periods)
    }

    /// `round_half_up(clamp(base * rate) * periods)`, zero for a zero base.
    fn contribution(
        base: Decimal,
        rate: Decimal,
        caps: Option<ContributionCaps>,
        periods: u32,
    ) -> Result<Decimal, CalculationError> {
        if base.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let periodic = checked_mul(base, rate, "contribution")?;
        let periodic = match caps {
            Some(caps) => clamp(periodic, caps.minimum, caps.maximum),
            None => periodic,
        };
        checked_mul(periodic, Decimal::from(periods), "contribution").map(round_half_up)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{BirthCohortCaps, ContributionClass, ContributionPeriod};

    fn malta() -> SocialSecurityRules {
        SocialSecurityRules {
            employee: Some(ContributionSchedule {
                period: ContributionPeriod::Weekly,
                rate: dec!(0.10),
                employer_rate: dec!(0.10),
                minimum: Some(dec!(2.43)),
                maximum: Some(dec!(54.43)),
                cohorts: vec![BirthCohortCaps {
                    born_on_or_before: 1961,
                    minimum: None,
                    maximum: Some(dec!(45.19)),
                }],
            }),
            self_employed: Some(ContributionSchedule {
                period: ContributionPeriod::Annual,
                rate: dec!(0.15),
                employer_rate: dec!(0),
                minimum: Some(dec!(540.00)),
                maximum: Some(dec!(3794.40)),
                cohorts: vec![BirthCohortCaps {
                    born_on_or_before: 1961,
                    minimum: None,
                    maximum: Some(dec!(2349.88)),
                }],
            }),
        }
    }

    fn inputs(
        class: ContributionClass,
        base: Decimal,
    ) -> SocialSecurityInputs {
        SocialSecurityInputs {
            class,
            base,
            birth_year: None,
            periods: None,
        }
    }

    fn total(assessment: &Assessment) -> Decimal {
        let gross: Decimal = assessment.breakdown.iter().map(|c| c.contribution_amount).sum();
        gross - assessment.adjustments
    }

    #[test]
    fn self_employed_capped_at_maximum() {
        let rules = malta();

        let result = SocialSecurityCalculator::new(&rules)
            .calculate(&inputs(ContributionClass::SelfEmployed, dec!(40000)))
            .unwrap();

        assert_eq!(total(&result), dec!(3794.40));
        assert_eq!(result.breakdown[0].contribution_amount, dec!(6000.00));
        assert_eq!(result.adjustments, dec!(2205.60));
        assert_eq!(result.employer_contribution, None);
    }

    #[test]
    fn self_employed_within_caps_pays_rate() {
        let rules = malta();

        let result = SocialSecurityCalculator::new(&rules)
            .calculate(&inputs(ContributionClass::SelfEmployed, dec!(10000)))
            .unwrap();

        assert_eq!(total(&result), dec!(1500.00));
        assert_eq!(result.adjustments, dec!(0.00));
    }

    #[test]
    fn minimum_raises_low_contribution() {
        let rules = malta();

        let result = SocialSecurityCalculator::new(&rules)
            .calculate(&inputs(ContributionClass::SelfEmployed, dec!(2000)))
            .unwrap();

        assert_eq!(total(&result), dec!(540.00));
        assert_eq!(result.adjustments, dec!(-240.00));
    }

    #[test]
    fn zero_base_owes_nothing() {
        let rules = malta();

        let result = SocialSecurityCalculator::new(&rules)
            .calculate(&inputs(ContributionClass::SelfEmployed, dec!(0)))
            .unwrap();

        assert_eq!(total(&result), dec!(0));
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn older_cohort_uses_lower_maximum() {
        let rules = malta();
        let input = SocialSecurityInputs {
            birth_year: Some(1960),
            ..inputs(ContributionClass::SelfEmployed, dec!(40000))
        };

        let result = SocialSecurityCalculator::new(&rules).calculate(&input).unwrap();

        assert_eq!(total(&result), dec!(2349.88));
    }

    #[test]
    fn employee_weekly_contribution_over_periods() {
        let rules = malta();
        let input = SocialSecurityInputs {
            periods: Some(52),
            ..inputs(ContributionClass::Employee, dec!(400))
        };

        let result = SocialSecurityCalculator::new(&rules).calculate(&input).unwrap();

        assert_eq!(total(&result), dec!(2080.00));
        assert_eq!(result.employer_contribution, Some(dec!(2080.00)));
        assert_eq!(result.base, dec!(20800));
        assert_eq!(result.periods, Some(52));
    }

    #[test]
    fn employee_weekly_cap_applies_per_week() {
        let rules = malta();
        let input = SocialSecurityInputs {
            periods: Some(2),
            ..inputs(ContributionClass::Employee, dec!(1000))
        };

        let result = SocialSecurityCalculator::new(&rules).calculate(&input).unwrap();

        assert_eq!(total(&result), dec!(108.86));
        assert_eq!(result.adjustments, dec!(91.14));
    }

    #[test]
    fn too_many_periods_is_rejected() {
        let rules = malta();
        let input = SocialSecurityInputs {
            periods: Some(54),
            ..inputs(ContributionClass::Employee, dec!(400))
        };

        let result = SocialSecurityCalculator::new(&rules).calculate(&input);

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { field: "periods", .. })
        ));
    }

    #[test]
    fn undefined_class_is_rejected() {
        let rules = SocialSecurityRules {
            employee: None,
            ..malta()
        };

        let result = SocialSecurityCalculator::new(&rules)
            .calculate(&inputs(ContributionClass::Employee, dec!(400)));

        assert!(matches!(
            result,
            Err(CalculationError::InvalidInput { field: "class", .. })
        ));
    }
}
