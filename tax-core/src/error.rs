use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::CalculationType;

/// Errors returned by [`TaxEngine::calculate`](crate::TaxEngine::calculate).
///
/// Every variant is a value error: the engine has no side effects, so a
/// failed calculation never leaves anything half done.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    /// No rule set is in effect for the jurisdiction on the requested date.
    #[error("no rule set found for jurisdiction '{jurisdiction}' on {as_of_date}")]
    RuleSetNotFound {
        jurisdiction: String,
        as_of_date: NaiveDate,
    },

    /// A request input is out of range or malformed.
    #[error("invalid input '{field}': {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The resolved rule set has no parameters for the calculation type.
    #[error("{calculation_type} is not supported by jurisdiction '{jurisdiction}'")]
    UnsupportedCalculationType {
        jurisdiction: String,
        calculation_type: CalculationType,
    },

    /// The requested VAT rate category is not defined by the rule set.
    #[error("VAT rate category '{0}' is not defined for this jurisdiction")]
    UnsupportedRateCategory(String),

    /// An intermediate value exceeded the decimal range.
    #[error("arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),
}

impl CalculationError {
    pub(crate) fn invalid(
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Rejects negative monetary inputs.
    pub(crate) fn ensure_non_negative(
        field: &'static str,
        value: Decimal,
    ) -> Result<(), Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(Self::invalid(field, format!("must not be negative, got {value}")));
        }
        Ok(())
    }
}

/// Errors raised while validating or publishing a rule set.
///
/// These surface at configuration-load time only. A rule set that made it
/// into the repository never produces one of these during a calculation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleSetError {
    #[error("jurisdiction code '{0}' must be 2 to 8 ASCII letters or digits")]
    InvalidJurisdictionCode(String),

    #[error("effective_from {from} must be before effective_to {to}")]
    InvalidEffectiveRange { from: NaiveDate, to: NaiveDate },

    #[error("bracket schedule is empty")]
    EmptySchedule,

    #[error("first bracket must start at 0, got {0}")]
    ScheduleStartsAboveZero(Decimal),

    #[error("bracket {index} starts at {lower} but the previous bracket ends at {previous_upper}")]
    NonContiguousBrackets {
        index: usize,
        lower: Decimal,
        previous_upper: Decimal,
    },

    #[error("bracket {index} upper bound {upper} is not above its lower bound {lower}")]
    EmptyBracket {
        index: usize,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("bracket {0} is unbounded but is not the last bracket")]
    UnboundedBracketNotLast(usize),

    #[error("last bracket must be unbounded")]
    MissingUnboundedBracket,

    #[error("rate '{field}' must be between 0 and 1, got {rate}")]
    RateOutOfRange { field: String, rate: Decimal },

    #[error("amount '{field}' must not be negative, got {amount}")]
    NegativeAmount { field: String, amount: Decimal },

    #[error("'{field}' minimum {minimum} exceeds maximum {maximum}")]
    InvertedCaps {
        field: String,
        minimum: Decimal,
        maximum: Decimal,
    },

    #[error("'{0}' cannot name a reduced VAT rate")]
    InvalidRateCategory(String),

    #[error("VAT rate category '{0}' is defined more than once")]
    DuplicateRateCategory(String),

    #[error("'{field}' must be positive, got {value}")]
    NonPositive { field: String, value: Decimal },

    #[error("rule set {jurisdiction} from {effective_from} overlaps an existing version from {existing_from}")]
    OverlappingVersion {
        jurisdiction: String,
        effective_from: NaiveDate,
        existing_from: NaiveDate,
    },
}
