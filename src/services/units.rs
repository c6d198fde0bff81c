//! Unit converter — length units through meters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UtilityError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    M,
    Cm,
    Ft,
    In,
}

impl LengthUnit {
    pub const ALL: [Self; 4] = [Self::M, Self::Cm, Self::Ft, Self::In];

    /// How many of this unit make one meter.
    #[must_use]
    pub fn per_meter(self) -> f64 {
        match self {
            Self::M => 1.0,
            Self::Cm => 100.0,
            Self::Ft => 3.28084,
            Self::In => 39.3701,
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::M => "m",
            Self::Cm => "cm",
            Self::Ft => "ft",
            Self::In => "in",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::M => "Meters",
            Self::Cm => "Centimeters",
            Self::Ft => "Feet",
            Self::In => "Inches",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for LengthUnit {
    type Err = UtilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|unit| unit.symbol() == s)
            .ok_or_else(|| UtilityError::validation(format!("unknown unit: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitConversion {
    pub value: f64,
    pub from: LengthUnit,
    pub to: LengthUnit,
    pub result: f64,
    /// `result` rounded to four decimals.
    pub formatted: String,
}

/// Convert a user-typed length between units.
///
/// # Errors
///
/// Returns `Validation("Invalid")` if `value` is not a finite number.
pub fn convert(value: &str, from: LengthUnit, to: LengthUnit) -> Result<UnitConversion, UtilityError> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| UtilityError::validation("Invalid"))?;

    let meters = parsed / from.per_meter();
    let result = meters * to.per_meter();
    Ok(UnitConversion { value: parsed, from, to, result, formatted: format!("{result:.4}") })
}
