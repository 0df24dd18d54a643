use serde::{Deserialize, Serialize};

/// Eco-point rates per unit of waste.
///
/// The unit is whatever the caller supplies; entries in this crate are always
/// recorded in grams, so the defaults award 4 points per wet gram and 2 per
/// dry gram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRates {
    pub wet_rate: f64,
    pub dry_rate: f64,
}

pub const WET_RATE: f64 = 4.0;
pub const DRY_RATE: f64 = 2.0;

impl Default for ScoringRates {
    fn default() -> Self {
        Self {
            wet_rate: WET_RATE,
            dry_rate: DRY_RATE,
        }
    }
}
