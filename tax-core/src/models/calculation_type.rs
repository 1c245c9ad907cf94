use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    IncomeTax,
    CorporateTax,
    Vat,
    SocialSecurity,
    StampDuty,
    CapitalGains,
}

impl CalculationType {
    pub const ALL: [CalculationType; 6] = [
        Self::IncomeTax,
        Self::CorporateTax,
        Self::Vat,
        Self::SocialSecurity,
        Self::StampDuty,
        Self::CapitalGains,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeTax => "income_tax",
            Self::CorporateTax => "corporate_tax",
            Self::Vat => "vat",
            Self::SocialSecurity => "social_security",
            Self::StampDuty => "stamp_duty",
            Self::CapitalGains => "capital_gains",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for CalculationType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_accepts_every_tag() {
        for calculation_type in CalculationType::ALL {
            assert_eq!(CalculationType::parse(calculation_type.as_str()), Some(calculation_type));
        }
    }

    #[test]
    fn parse_rejects_unknown_tag() {
        assert_eq!(CalculationType::parse("wealth_tax"), None);
    }
}
