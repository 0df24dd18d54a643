use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{EntryDraft, EntryOrigin, LiveReading, WasteCategory, WasteEntry};
use crate::scoring::{parse_quantity, sanitize, score, ScoringRates};

pub const CATEGORY_REQUIRED_MESSAGE: &str = "Please select a waste category";
pub const QUANTITY_REQUIRED_MESSAGE: &str = "Please enter a quantity for the selected category";

/// The Wet xor Dry selector on the entry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManualCategory {
    Wet,
    Dry,
}

impl From<ManualCategory> for WasteCategory {
    fn from(value: ManualCategory) -> Self {
        match value {
            ManualCategory::Wet => WasteCategory::Wet,
            ManualCategory::Dry => WasteCategory::Dry,
        }
    }
}

/// State of the waste entry form for one citizen.
///
/// The form is either filled in by hand or pre-filled from a finalized live
/// reading, in which case the quantity fields are read-only.
#[derive(Debug, Clone)]
pub struct EntryForm {
    user_id: String,
    rates: ScoringRates,
    wet_input: String,
    dry_input: String,
    selected: Option<ManualCategory>,
    prefill: Option<LiveReading>,
    validation_message: Option<String>,
}

impl EntryForm {
    pub fn new(user_id: impl Into<String>, rates: ScoringRates) -> Self {
        Self {
            user_id: user_id.into(),
            rates,
            wet_input: String::new(),
            dry_input: String::new(),
            selected: None,
            prefill: None,
            validation_message: None,
        }
    }

    pub fn set_wet_input(&mut self, raw: impl Into<String>) -> Result<()> {
        if self.is_read_only() {
            bail!("quantities are read-only while a live reading is loaded");
        }
        self.wet_input = raw.into();
        Ok(())
    }

    pub fn set_dry_input(&mut self, raw: impl Into<String>) -> Result<()> {
        if self.is_read_only() {
            bail!("quantities are read-only while a live reading is loaded");
        }
        self.dry_input = raw.into();
        Ok(())
    }

    pub fn select_category(&mut self, category: ManualCategory) {
        self.selected = Some(category);
        self.validation_message = None;
    }

    /// Load a finalized live reading; replaces anything typed so far.
    pub fn prefill_from(&mut self, reading: LiveReading) {
        self.wet_input.clear();
        self.dry_input.clear();
        self.selected = None;
        self.validation_message = None;
        self.prefill = Some(reading);
    }

    pub fn is_read_only(&self) -> bool {
        self.prefill.is_some()
    }

    pub fn prefilled_reading(&self) -> Option<&LiveReading> {
        self.prefill.as_ref()
    }

    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    /// The category a confirm would record, if one can be determined.
    pub fn resolved_category(&self) -> Option<WasteCategory> {
        if let Some(reading) = &self.prefill {
            return WasteCategory::from_feed_label(&reading.waste_type_label)
                .or(self.selected.map(WasteCategory::from));
        }

        if let Some(selected) = self.selected {
            return Some(selected.into());
        }

        let (wet, dry) = self.raw_quantities();
        match (wet > 0.0, dry > 0.0) {
            (true, false) | (false, true) => Some(WasteCategory::Manual),
            (true, true) => Some(WasteCategory::Mixed),
            (false, false) => None,
        }
    }

    pub fn can_confirm(&self) -> bool {
        self.draft().is_ok()
    }

    /// Points the current input would earn, for the live estimate card.
    pub fn estimated_points(&self) -> u64 {
        match self.draft() {
            Ok(draft) => score(draft.wet_waste_grams, draft.dry_waste_grams, &self.rates),
            Err(_) => {
                let (wet, dry) = self.raw_quantities();
                score(wet, dry, &self.rates)
            }
        }
    }

    /// Build the entry and clear the form.
    ///
    /// Without a category, or with nothing recorded for the chosen one, the
    /// form is left untouched apart from the inline validation message and an
    /// error is returned.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> Result<WasteEntry> {
        let entry = self.prepare(now)?;
        self.clear();
        Ok(entry)
    }

    /// Like [`EntryForm::confirm`] but keeps the input, for callers that
    /// clear only after the entry has been stored.
    pub fn prepare(&mut self, now: DateTime<Utc>) -> Result<WasteEntry> {
        let draft = match self.draft() {
            Ok(draft) => draft,
            Err(message) => {
                self.validation_message = Some(message.to_string());
                bail!(message);
            }
        };

        Ok(WasteEntry::create(self.user_id.clone(), draft, &self.rates, now))
    }

    pub fn clear(&mut self) {
        self.wet_input.clear();
        self.dry_input.clear();
        self.selected = None;
        self.prefill = None;
        self.validation_message = None;
    }

    fn raw_quantities(&self) -> (f64, f64) {
        (parse_quantity(&self.wet_input), parse_quantity(&self.dry_input))
    }

    fn draft(&self) -> Result<EntryDraft, &'static str> {
        let category = self.resolved_category().ok_or(CATEGORY_REQUIRED_MESSAGE)?;

        let draft = match &self.prefill {
            Some(reading) => {
                let (wet, dry) = match category {
                    WasteCategory::Dry => (0.0, reading.weight),
                    _ => (reading.weight, 0.0),
                };
                EntryDraft {
                    wet_waste_grams: wet,
                    dry_waste_grams: dry,
                    category,
                    origin: EntryOrigin::LiveFeed,
                    source_label: Some(reading.waste_type_label.clone()),
                }
            }
            None => {
                let (wet, dry) = self.raw_quantities();
                EntryDraft {
                    wet_waste_grams: wet,
                    dry_waste_grams: dry,
                    category,
                    origin: EntryOrigin::Manual,
                    source_label: None,
                }
            }
        };

        // A Wet or Dry entry must carry weight in its own stream.
        let recorded = match category {
            WasteCategory::Wet => draft.wet_waste_grams,
            WasteCategory::Dry => draft.dry_waste_grams,
            _ => draft.wet_waste_grams + draft.dry_waste_grams,
        };
        if sanitize(recorded) == 0.0 {
            return Err(QUANTITY_REQUIRED_MESSAGE);
        }

        Ok(draft)
    }
}
