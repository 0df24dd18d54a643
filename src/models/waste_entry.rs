//! Finalized waste contributions.
//!
//! A `WasteEntry` is immutable once built: its points are computed exactly
//! once in [`WasteEntry::create`] and restored verbatim from storage.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::scoring::{sanitize, score, ScoringRates};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Wet,
    Dry,
    Mixed,
    Manual,
    Unknown,
}

impl WasteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Wet => "wet",
            WasteCategory::Dry => "dry",
            WasteCategory::Mixed => "mixed",
            WasteCategory::Manual => "manual",
            WasteCategory::Unknown => "unknown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "wet" => Some(WasteCategory::Wet),
            "dry" => Some(WasteCategory::Dry),
            "mixed" => Some(WasteCategory::Mixed),
            "manual" => Some(WasteCategory::Manual),
            "unknown" => Some(WasteCategory::Unknown),
            _ => None,
        }
    }

    /// Map a free-text feed label onto a single-stream category.
    ///
    /// Only labels that unambiguously name wet or dry waste are recognized;
    /// everything else needs a human to pick.
    pub fn from_feed_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "wet" | "organic" | "biodegradable" => Some(WasteCategory::Wet),
            "dry" | "plastic" | "recyclable" => Some(WasteCategory::Dry),
            _ => None,
        }
    }

    /// Display category derived purely from the recorded quantities.
    pub fn primary(wet_grams: f64, dry_grams: f64) -> Self {
        match (wet_grams > 0.0, dry_grams > 0.0) {
            (true, false) => WasteCategory::Wet,
            (false, true) => WasteCategory::Dry,
            (true, true) => WasteCategory::Mixed,
            (false, false) => WasteCategory::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EntryOrigin {
    LiveFeed,
    Manual,
}

impl EntryOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryOrigin::LiveFeed => "LiveFeed",
            EntryOrigin::Manual => "Manual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LiveFeed" => Some(EntryOrigin::LiveFeed),
            "Manual" => Some(EntryOrigin::Manual),
            _ => None,
        }
    }
}

/// Quantities and provenance of an entry that has not been scored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub wet_waste_grams: f64,
    pub dry_waste_grams: f64,
    pub category: WasteCategory,
    pub origin: EntryOrigin,
    pub source_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WasteEntry {
    id: String,
    user_id: String,
    timestamp: DateTime<Utc>,
    wet_waste_grams: f64,
    dry_waste_grams: f64,
    category: WasteCategory,
    origin: EntryOrigin,
    source_label: Option<String>,
    eco_points_earned: u64,
}

impl WasteEntry {
    pub fn create(
        user_id: impl Into<String>,
        draft: EntryDraft,
        rates: &ScoringRates,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut wet = sanitize(draft.wet_waste_grams);
        let mut dry = sanitize(draft.dry_waste_grams);
        match draft.category {
            WasteCategory::Wet => dry = 0.0,
            WasteCategory::Dry => wet = 0.0,
            _ => {}
        }

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            timestamp,
            wet_waste_grams: wet,
            dry_waste_grams: dry,
            category: draft.category,
            origin: draft.origin,
            source_label: draft.source_label,
            eco_points_earned: score(wet, dry, rates),
        }
    }

    /// Rebuild a stored entry without rescoring it.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: String,
        user_id: String,
        timestamp: DateTime<Utc>,
        wet_waste_grams: f64,
        dry_waste_grams: f64,
        category: WasteCategory,
        origin: EntryOrigin,
        source_label: Option<String>,
        eco_points_earned: u64,
    ) -> Self {
        Self {
            id,
            user_id,
            timestamp,
            wet_waste_grams,
            dry_waste_grams,
            category,
            origin,
            source_label,
            eco_points_earned,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn wet_waste_grams(&self) -> f64 {
        self.wet_waste_grams
    }

    pub fn dry_waste_grams(&self) -> f64 {
        self.dry_waste_grams
    }

    pub fn category(&self) -> WasteCategory {
        self.category
    }

    pub fn origin(&self) -> EntryOrigin {
        self.origin
    }

    pub fn source_label(&self) -> Option<&str> {
        self.source_label.as_deref()
    }

    pub fn eco_points_earned(&self) -> u64 {
        self.eco_points_earned
    }

    pub fn primary_category(&self) -> WasteCategory {
        WasteCategory::primary(self.wet_waste_grams, self.dry_waste_grams)
    }

    pub fn is_auto_filled(&self) -> bool {
        self.origin == EntryOrigin::LiveFeed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(wet: f64, dry: f64, category: WasteCategory) -> EntryDraft {
        EntryDraft {
            wet_waste_grams: wet,
            dry_waste_grams: dry,
            category,
            origin: EntryOrigin::Manual,
            source_label: None,
        }
    }

    #[test]
    fn test_create_scores_once_and_zeroes_other_stream() {
        let entry = WasteEntry::create(
            "citizen-1",
            draft(30.0, 12.0, WasteCategory::Dry),
            &ScoringRates::default(),
            Utc::now(),
        );
        assert_eq!(entry.wet_waste_grams(), 0.0);
        assert_eq!(entry.dry_waste_grams(), 12.0);
        assert_eq!(entry.eco_points_earned(), 24);
    }

    #[test]
    fn test_create_assigns_unique_ids() {
        let rates = ScoringRates::default();
        let a = WasteEntry::create("u", draft(1.0, 0.0, WasteCategory::Wet), &rates, Utc::now());
        let b = WasteEntry::create("u", draft(1.0, 0.0, WasteCategory::Wet), &rates, Utc::now());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_feed_label_mapping() {
        assert_eq!(WasteCategory::from_feed_label(" WET "), Some(WasteCategory::Wet));
        assert_eq!(WasteCategory::from_feed_label("plastic"), Some(WasteCategory::Dry));
        assert_eq!(WasteCategory::from_feed_label("Unknown"), None);
        assert_eq!(WasteCategory::from_feed_label("mixed"), None);
    }

    #[test]
    fn test_primary_category_from_quantities() {
        assert_eq!(WasteCategory::primary(1.0, 0.0), WasteCategory::Wet);
        assert_eq!(WasteCategory::primary(0.0, 1.0), WasteCategory::Dry);
        assert_eq!(WasteCategory::primary(1.0, 1.0), WasteCategory::Mixed);
        assert_eq!(WasteCategory::primary(0.0, 0.0), WasteCategory::Unknown);
    }

    #[test]
    fn test_entry_serializes_camel_case_with_lowercase_category() {
        let entry = WasteEntry::create(
            "citizen-1",
            draft(120.0, 0.0, WasteCategory::Wet),
            &ScoringRates::default(),
            Utc::now(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["category"], "wet");
        assert_eq!(json["ecoPointsEarned"], 480);
        assert_eq!(json["wetWasteGrams"], 120.0);
    }
}
