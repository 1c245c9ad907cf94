use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{
    AdjustmentModel, Allowances, BracketSchedule, CalculationRequest, CalculationResult,
    ContributionClass, ContributionPeriod, ContributionSchedule, IncomeTaxInputs,
    IncomeTaxRules, JurisdictionRuleSet, MaritalStatus, QuotientParts, RuleSetRepository,
    SocialSecurityInputs, SocialSecurityRules, TaxBracket, TaxEngine,
};

// -- Fixtures --

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
}

fn malta_single() -> BracketSchedule {
    BracketSchedule::new(vec![
        TaxBracket::new(dec!(0), Some(dec!(9100)), dec!(0.00)),
        TaxBracket::new(dec!(9100), Some(dec!(14500)), dec!(0.15)),
        TaxBracket::new(dec!(14500), Some(dec!(19500)), dec!(0.25)),
        TaxBracket::new(dec!(19500), Some(dec!(60000)), dec!(0.25)),
        TaxBracket::new(dec!(60000), None, dec!(0.35)),
    ])
    .unwrap()
}

fn france() -> BracketSchedule {
    BracketSchedule::new(vec![
        TaxBracket::new(dec!(0), Some(dec!(11497)), dec!(0.00)),
        TaxBracket::new(dec!(11497), Some(dec!(29315)), dec!(0.11)),
        TaxBracket::new(dec!(29315), Some(dec!(83823)), dec!(0.30)),
        TaxBracket::new(dec!(83823), Some(dec!(180294)), dec!(0.41)),
        TaxBracket::new(dec!(180294), None, dec!(0.45)),
    ])
    .unwrap()
}

fn engine() -> TaxEngine {
    let from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let malta = JurisdictionRuleSet {
        income_tax: Some(IncomeTaxRules {
            single: malta_single(),
            married: None,
            allowances: Allowances {
                married: dec!(600),
                ..Allowances::default()
            },
            adjustment: AdjustmentModel::FlatAllowance,
        }),
        social_security: Some(SocialSecurityRules {
            employee: None,
            self_employed: Some(ContributionSchedule {
                period: ContributionPeriod::Annual,
                rate: dec!(0.15),
                employer_rate: dec!(0),
                minimum: Some(dec!(540.00)),
                maximum: Some(dec!(3794.40)),
                cohorts: vec![],
            }),
        }),
        ..JurisdictionRuleSet::new("MT", from)
    };
    let france = JurisdictionRuleSet {
        income_tax: Some(IncomeTaxRules {
            single: france(),
            married: None,
            allowances: Allowances::default(),
            adjustment: AdjustmentModel::FamilyQuotient(QuotientParts::default()),
        }),
        ..JurisdictionRuleSet::new("FR", from)
    };
    TaxEngine::new(Arc::new(RuleSetRepository::with_rule_sets([malta, france]).unwrap()))
}

fn income_request(
    jurisdiction: &str,
    income: Decimal,
    status: MaritalStatus,
    dependents: u32,
) -> CalculationRequest {
    CalculationRequest::new(
        jurisdiction,
        as_of(),
        IncomeTaxInputs {
            gross_income: income,
            marital_status: status,
            dependent_count: dependents,
            deductions: Decimal::ZERO,
            tax_credits: Decimal::ZERO,
        },
    )
}

fn income_total(
    engine: &TaxEngine,
    jurisdiction: &str,
    income: Decimal,
    status: MaritalStatus,
    dependents: u32,
) -> Decimal {
    engine
        .calculate(&income_request(jurisdiction, income, status, dependents))
        .unwrap()
        .total
}

fn breakdown_sum(result: &CalculationResult) -> Decimal {
    result.breakdown.iter().map(|line| line.contribution_amount).sum()
}

// -- Strategy helpers --

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (0i64..50_000_000_00).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_jurisdiction() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("MT"), Just("FR")]
}

fn arb_status() -> impl Strategy<Value = MaritalStatus> {
    prop_oneof![
        Just(MaritalStatus::Single),
        Just(MaritalStatus::Married),
        Just(MaritalStatus::Widowed),
        Just(MaritalStatus::Separated),
    ]
}

proptest! {
    #[test]
    fn income_tax_is_monotonic(
        jurisdiction in arb_jurisdiction(),
        income in arb_amount(),
        raise in arb_amount(),
        status in arb_status(),
        dependents in 0u32..6,
    ) {
        let engine = engine();
        let lower = income_total(&engine, jurisdiction, income, status, dependents);
        let higher = income_total(&engine, jurisdiction, income + raise, status, dependents);
        prop_assert!(lower <= higher, "{lower} > {higher}");
    }

    #[test]
    fn breakdown_sums_to_total(
        jurisdiction in arb_jurisdiction(),
        income in arb_amount(),
        status in arb_status(),
        dependents in 0u32..6,
    ) {
        let result = engine()
            .calculate(&income_request(jurisdiction, income, status, dependents))
            .unwrap();
        prop_assert_eq!(breakdown_sum(&result), result.total);
        prop_assert_eq!(result.gross_amount() - result.adjustments_applied, result.total);
        prop_assert!(result.total >= Decimal::ZERO);
        prop_assert!(result.effective_rate <= Decimal::ONE);
        prop_assert!(result.marginal_rate >= Decimal::ZERO && result.marginal_rate <= Decimal::ONE);
    }

    #[test]
    fn contribution_breakdown_sums_to_total(base in arb_amount()) {
        let request = CalculationRequest::new(
            "MT",
            as_of(),
            SocialSecurityInputs {
                class: ContributionClass::SelfEmployed,
                base,
                birth_year: None,
                periods: None,
            },
        );
        let result = engine().calculate(&request).unwrap();
        prop_assert_eq!(breakdown_sum(&result), result.total);
        prop_assert_eq!(result.gross_amount() - result.adjustments_applied, result.total);
        prop_assert!(result.total <= dec!(3794.40));
    }

    #[test]
    fn tax_across_each_boundary_follows_both_rates(
        (jurisdiction, schedule) in prop_oneof![
            Just(("MT", malta_single())),
            Just(("FR", france())),
        ],
        step in 1i64..1_000_000,
    ) {
        let engine = engine();
        let step = Decimal::new(step, 2);
        let brackets = schedule.brackets();
        for (bracket, next) in brackets.iter().zip(brackets.iter().skip(1)) {
            let Some(upper) = bracket.upper_bound else {
                continue;
            };
            let mut eps = step.min(upper - bracket.lower_bound);
            if let Some(next_upper) = next.upper_bound {
                eps = eps.min(next_upper - upper);
            }

            let below = income_total(&engine, jurisdiction, upper - eps, MaritalStatus::Single, 0);
            let above = income_total(&engine, jurisdiction, upper + eps, MaritalStatus::Single, 0);
            let expected = eps * bracket.rate + eps * next.rate;

            prop_assert!(
                (above - below - expected).abs() <= dec!(0.02),
                "{} at {}: {} - {} differs from {}",
                jurisdiction,
                upper,
                above,
                below,
                expected
            );
        }
    }

    #[test]
    fn calculation_is_idempotent(
        jurisdiction in arb_jurisdiction(),
        income in arb_amount(),
        status in arb_status(),
    ) {
        let engine = engine();
        let request = income_request(jurisdiction, income, status, 1);
        prop_assert_eq!(engine.calculate(&request), engine.calculate(&request));
    }
}

#[test]
fn zero_base_is_zero_in_every_jurisdiction() {
    let engine = engine();
    for jurisdiction in ["MT", "FR"] {
        let result = engine
            .calculate(&income_request(jurisdiction, Decimal::ZERO, MaritalStatus::Married, 2))
            .unwrap();
        assert_eq!(result.total, Decimal::ZERO);
        assert!(result.breakdown.is_empty());
    }
}
