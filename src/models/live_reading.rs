use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest values observed on the sensor feed.
///
/// Owned by the feed listener; the zero state (`weight = 0`, empty label)
/// means no message has been seen since the last reset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveReading {
    pub weight: f64,
    pub waste_type_label: String,
    pub observed_at: Option<DateTime<Utc>>,
}

impl LiveReading {
    pub fn is_empty(&self) -> bool {
        self.observed_at.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
