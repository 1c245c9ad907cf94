use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RuleSetError;

/// One marginal-rate band. `upper_bound` of `None` means unbounded.
///
/// A bracket covers the half-open range `(lower_bound, upper_bound]`: an
/// amount exactly on a boundary belongs to the lower bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        lower_bound: Decimal,
        upper_bound: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
        }
    }

    /// Whether `amount` falls inside `(lower_bound, upper_bound]`.
    pub fn contains(
        &self,
        amount: Decimal,
    ) -> bool {
        amount > self.lower_bound && self.upper_bound.is_none_or(|upper| amount <= upper)
    }
}

/// An ordered, validated sequence of [`TaxBracket`]s.
///
/// Construction enforces the schedule invariants:
/// - at least one bracket, the first starting at zero;
/// - each bracket's upper bound equals the next bracket's lower bound;
/// - bounds strictly increase;
/// - exactly one unbounded bracket, and it is the last;
/// - every rate lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct BracketSchedule(Vec<TaxBracket>);

impl BracketSchedule {
    pub fn new(brackets: Vec<TaxBracket>) -> Result<Self, RuleSetError> {
        let first = brackets.first().ok_or(RuleSetError::EmptySchedule)?;
        if !first.lower_bound.is_zero() {
            return Err(RuleSetError::ScheduleStartsAboveZero(first.lower_bound));
        }

        let last_index = brackets.len() - 1;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(RuleSetError::RateOutOfRange {
                    field: format!("brackets[{index}].rate"),
                    rate: bracket.rate,
                });
            }

            match bracket.upper_bound {
                Some(upper) if upper <= bracket.lower_bound => {
                    return Err(RuleSetError::EmptyBracket {
                        index,
                        lower: bracket.lower_bound,
                        upper,
                    });
                }
                None if index != last_index => {
                    return Err(RuleSetError::UnboundedBracketNotLast(index));
                }
                Some(_) if index == last_index => {
                    return Err(RuleSetError::MissingUnboundedBracket);
                }
                _ => {}
            }

            if index > 0 {
                let previous_upper = brackets[index - 1]
                    .upper_bound
                    .ok_or(RuleSetError::UnboundedBracketNotLast(index - 1))?;
                if previous_upper != bracket.lower_bound {
                    return Err(RuleSetError::NonContiguousBrackets {
                        index,
                        lower: bracket.lower_bound,
                        previous_upper,
                    });
                }
            }
        }

        Ok(Self(brackets))
    }

    /// A single unbounded bracket at `rate`.
    pub fn flat(rate: Decimal) -> Result<Self, RuleSetError> {
        Self::new(vec![TaxBracket::new(Decimal::ZERO, None, rate)])
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bracket taxing the last unit of `amount`.
    ///
    /// Zero (and anything below) maps to the first bracket; an amount on a
    /// boundary maps to the bracket it closes.
    pub fn bracket_for(
        &self,
        amount: Decimal,
    ) -> &TaxBracket {
        let last = self.0.len() - 1;
        if amount <= self.0[0].lower_bound {
            return &self.0[0];
        }
        self.0
            .iter()
            .find(|bracket| bracket.contains(amount))
            .unwrap_or(&self.0[last])
    }
}

impl TryFrom<Vec<TaxBracket>> for BracketSchedule {
    type Error = RuleSetError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        Self::new(brackets)
    }
}

impl From<BracketSchedule> for Vec<TaxBracket> {
    fn from(schedule: BracketSchedule) -> Self {
        schedule.0
    }
}
