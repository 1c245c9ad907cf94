use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalculationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    #[default]
    Single,
    Married,
    Widowed,
    Separated,
}

impl MaritalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
            Self::Widowed => "widowed",
            Self::Separated => "separated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(Self::Single),
            "married" => Some(Self::Married),
            "widowed" => Some(Self::Widowed),
            "separated" => Some(Self::Separated),
            _ => None,
        }
    }

    /// Only a married taxpayer gets the married schedule, allowance and
    /// quotient part.
    pub fn is_married(&self) -> bool {
        matches!(self, Self::Married)
    }
}

impl FromStr for MaritalStatus {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim()).ok_or_else(|| {
            CalculationError::invalid(
                "marital_status",
                format!("'{s}' is not one of single, married, widowed, separated"),
            )
        })
    }
}
