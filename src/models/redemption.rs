use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: String,
    pub user_id: String,
    pub reward_id: u32,
    pub reward_name: String,
    pub points_spent: u64,
    pub redeemed_at: DateTime<Utc>,
}
