//! Emission domains and the fixed per-unit CO2 conversion factors.
//!
//! | Unit | kg CO2 per unit | Category |
//! |------|-----------------|----------|
//! | km (car) | 0.2 | transport |
//! | liter (fuel) | 2.3 | transport |
//! | hour (electricity) | 0.5 | energy |

use serde::{Deserialize, Serialize};

/// Broad activity domain an emission is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Transport,
    Energy,
    Food,
    Waste,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 4] = [
        ActivityCategory::Transport,
        ActivityCategory::Energy,
        ActivityCategory::Food,
        ActivityCategory::Waste,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Transport => "transport",
            ActivityCategory::Energy => "energy",
            ActivityCategory::Food => "food",
            ActivityCategory::Waste => "waste",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "transport" => Some(ActivityCategory::Transport),
            "energy" => Some(ActivityCategory::Energy),
            "food" => Some(ActivityCategory::Food),
            "waste" => Some(ActivityCategory::Waste),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measurement unit recognised after a spoken quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "km")]
    Kilometer,
    #[serde(rename = "liter")]
    Liter,
    #[serde(rename = "hour")]
    Hour,
}

impl Unit {
    /// kg CO2-equivalent per one unit.
    pub fn co2_factor(self) -> f64 {
        match self {
            Unit::Kilometer => 0.2,
            Unit::Liter => 2.3,
            Unit::Hour => 0.5,
        }
    }

    /// Domain the unit implies: distance by car and fuel volume are transport,
    /// duration is electricity use.
    pub fn category(self) -> ActivityCategory {
        match self {
            Unit::Kilometer | Unit::Liter => ActivityCategory::Transport,
            Unit::Hour => ActivityCategory::Energy,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Kilometer => "km",
            Unit::Liter => "L",
            Unit::Hour => "h",
        }
    }

    /// Map a lowercase token spoken after a number to a unit.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "km" | "kilometre" | "kilometer" | "kilometres" | "kilometers" => {
                Some(Unit::Kilometer)
            }
            "l" | "lt" | "liter" | "litre" | "liters" | "litres" => Some(Unit::Liter),
            "h" | "hour" | "hours" | "hr" | "hrs" | "saat" | "sa" => Some(Unit::Hour),
            _ => None,
        }
    }

    /// Convert a quantity in this unit to kg CO2.
    pub fn to_co2(self, quantity: f64) -> f64 {
        quantity * self.co2_factor()
    }
}

/// Render a quantity without a trailing `.0` for whole numbers.
pub fn format_quantity(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format!("{value:.0}")
    } else {
        let rendered = format!("{value:.2}");
        rendered.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
