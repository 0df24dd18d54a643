use serde::Serialize;

use crate::models::WasteEntry;
use crate::scoring::ImpactEstimate;

/// Read-only aggregates over a user's history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub count: usize,
    pub total_wet_grams: f64,
    pub total_dry_grams: f64,
    pub total_points: u64,
    pub auto_filled_count: usize,
    pub manual_count: usize,
}

impl HistorySummary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a WasteEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |mut summary, entry| {
                summary.count += 1;
                summary.total_wet_grams += entry.wet_waste_grams();
                summary.total_dry_grams += entry.dry_waste_grams();
                summary.total_points += entry.eco_points_earned();
                if entry.is_auto_filled() {
                    summary.auto_filled_count += 1;
                } else {
                    summary.manual_count += 1;
                }
                summary
            })
    }

    pub fn impact(&self) -> ImpactEstimate {
        ImpactEstimate::from_wet_grams(self.total_wet_grams)
    }
}
