use serde::{Deserialize, Serialize};

/// Cubic metres of biogas produced per kilogram of wet waste.
const BIOGAS_M3_PER_KG: f64 = 0.04;
/// Meals worth of cooking energy per kilogram of wet waste.
const MEALS_PER_KG: f64 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactEstimate {
    pub biogas_m3: f64,
    pub meals: u64,
}

impl ImpactEstimate {
    /// Biogas is rounded to three decimals, meals to the nearest whole meal.
    pub fn from_wet_grams(wet_grams: f64) -> Self {
        let kg = super::sanitize(wet_grams) / 1000.0;
        Self {
            biogas_m3: (kg * BIOGAS_M3_PER_KG * 1000.0).round() / 1000.0,
            meals: (kg * MEALS_PER_KG).round() as u64,
        }
    }
}
