//! Append-only contribution history for one citizen.

mod summary;

use anyhow::{bail, Context, Result};

use crate::db::Database;
use crate::models::WasteEntry;

pub use summary::HistorySummary;

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub struct HistoryLedger {
    user_id: String,
    entries: Vec<WasteEntry>,
    store: Option<Database>,
}

impl HistoryLedger {
    /// Session-only ledger with no backing store.
    pub fn in_memory(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            entries: Vec::new(),
            store: None,
        }
    }

    /// Ledger backed by the database, preloaded with the user's stored entries.
    pub async fn open(db: Database, user_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        let entries = db
            .list_waste_entries(&user_id)
            .await
            .with_context(|| format!("failed to load history for {user_id}"))?;
        log_info!("Loaded {} history entries for {}", entries.len(), user_id);

        Ok(Self {
            user_id,
            entries,
            store: Some(db),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The backing database, if this ledger persists its entries.
    pub fn store(&self) -> Option<&Database> {
        self.store.as_ref()
    }

    /// Persist (when backed) and then record the entry.
    pub async fn append(&mut self, entry: WasteEntry) -> Result<()> {
        if entry.user_id() != self.user_id {
            bail!(
                "entry {} belongs to {}, not {}",
                entry.id(),
                entry.user_id(),
                self.user_id
            );
        }

        if let Some(db) = &self.store {
            db.insert_waste_entry(&entry).await?;
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[WasteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest first; entries sharing a timestamp keep reverse insertion order.
    pub fn recent_first(&self) -> Vec<&WasteEntry> {
        let mut view: Vec<&WasteEntry> = self.entries.iter().rev().collect();
        view.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        view
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary::from_entries(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryDraft, EntryOrigin, WasteCategory};
    use crate::scoring::ScoringRates;
    use chrono::{Duration, TimeZone, Utc};

    fn entry(wet: f64, dry: f64, category: WasteCategory, origin: EntryOrigin, offset_secs: i64) -> WasteEntry {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        WasteEntry::create(
            "citizen-1",
            EntryDraft {
                wet_waste_grams: wet,
                dry_waste_grams: dry,
                category,
                origin,
                source_label: None,
            },
            &ScoringRates::default(),
            base + Duration::seconds(offset_secs),
        )
    }

    #[tokio::test]
    async fn test_summary_aggregates_entries() {
        let mut ledger = HistoryLedger::in_memory("citizen-1");
        ledger
            .append(entry(10.0, 0.0, WasteCategory::Wet, EntryOrigin::LiveFeed, 0))
            .await
            .unwrap();
        ledger
            .append(entry(0.0, 5.0, WasteCategory::Dry, EntryOrigin::Manual, 1))
            .await
            .unwrap();

        let summary = ledger.summary();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_wet_grams, 10.0);
        assert_eq!(summary.total_dry_grams, 5.0);
        assert_eq!(summary.total_points, 50);
        assert_eq!(summary.auto_filled_count, 1);
        assert_eq!(summary.manual_count, 1);
    }

    #[tokio::test]
    async fn test_recent_first_orders_by_timestamp() {
        let mut ledger = HistoryLedger::in_memory("citizen-1");
        for offset in [5, 1, 9] {
            ledger
                .append(entry(1.0, 0.0, WasteCategory::Wet, EntryOrigin::Manual, offset))
                .await
                .unwrap();
        }

        let view = ledger.recent_first();
        let order: Vec<_> = view.iter().map(|e| e.timestamp()).collect();
        let mut expected = order.clone();
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(order, expected);
        // Insertion order is untouched.
        assert_eq!(ledger.entries()[0].timestamp(), view[1].timestamp());
    }

    #[tokio::test]
    async fn test_append_rejects_foreign_entries() {
        let mut ledger = HistoryLedger::in_memory("citizen-2");
        let result = ledger
            .append(entry(1.0, 0.0, WasteCategory::Wet, EntryOrigin::Manual, 0))
            .await;
        assert!(result.is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let ledger = HistoryLedger::in_memory("citizen-1");
        assert_eq!(ledger.summary(), HistorySummary::default());
        assert_eq!(ledger.summary().impact().meals, 0);
    }
}
