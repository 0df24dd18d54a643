use serde::Serialize;

use crate::ledger::HistorySummary;
use crate::models::{LiveReading, Redemption, WasteEntry};

/// Notifications for whatever surface renders the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DashboardEvent {
    #[serde(rename_all = "camelCase")]
    ReadingFinalized {
        reading: LiveReading,
        awaiting_confirmation: bool,
    },
    EntrySubmitted {
        entry: WasteEntry,
        summary: HistorySummary,
    },
    ListenerReset,
    #[serde(rename_all = "camelCase")]
    RewardRedeemed {
        redemption: Redemption,
        balance: u64,
    },
}
