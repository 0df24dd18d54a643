mod impact;
mod rates;

pub use impact::ImpactEstimate;
pub use rates::{ScoringRates, DRY_RATE, WET_RATE};

/// Clamp a raw quantity to a usable non-negative value.
///
/// NaN, infinities and negatives all become zero.
pub fn sanitize(quantity: f64) -> f64 {
    if quantity.is_finite() && quantity > 0.0 {
        quantity
    } else {
        0.0
    }
}

/// Parse a human-entered quantity, falling back to zero on anything unusable.
pub fn parse_quantity(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(sanitize).unwrap_or(0.0)
}

/// Eco-points awarded for a contribution: `floor(wet * wet_rate + dry * dry_rate)`.
pub fn score(wet: f64, dry: f64, rates: &ScoringRates) -> u64 {
    let points = sanitize(wet) * sanitize(rates.wet_rate) + sanitize(dry) * sanitize(rates.dry_rate);
    points.floor() as u64
}
