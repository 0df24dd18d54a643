mod catalog;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::Database;
use crate::models::Redemption;

pub use catalog::{find_reward, Reward, REWARD_CATALOG};

pub const NOT_ENOUGH_POINTS_MESSAGE: &str = "Not enough eco-points";

/// Spendable eco-points: everything earned minus everything redeemed.
///
/// When opened against the database every redemption is stored before the
/// wallet records it.
#[derive(Clone)]
pub struct EcoWallet {
    user_id: String,
    earned: u64,
    redemptions: Vec<Redemption>,
    store: Option<Database>,
}

impl EcoWallet {
    /// Session-only wallet. `redemptions` are expected most recent first.
    pub fn new(user_id: impl Into<String>, earned: u64, redemptions: Vec<Redemption>) -> Self {
        Self {
            user_id: user_id.into(),
            earned,
            redemptions,
            store: None,
        }
    }

    /// Wallet backed by the database, preloaded with the user's past redemptions.
    pub async fn open(db: Database, user_id: impl Into<String>, earned: u64) -> Result<Self> {
        let user_id = user_id.into();
        let redemptions = db
            .list_redemptions(&user_id)
            .await
            .with_context(|| format!("failed to load redemptions for {user_id}"))?;

        Ok(Self {
            user_id,
            earned,
            redemptions,
            store: Some(db),
        })
    }

    pub fn balance(&self) -> u64 {
        let spent: u64 = self.redemptions.iter().map(|r| r.points_spent).sum();
        self.earned.saturating_sub(spent)
    }

    pub fn credit(&mut self, points: u64) {
        self.earned = self.earned.saturating_add(points);
    }

    pub fn can_redeem(&self, reward: &Reward) -> bool {
        self.balance() >= reward.points_required
    }

    pub fn redemptions(&self) -> &[Redemption] {
        &self.redemptions
    }

    pub async fn redeem(&mut self, reward_id: u32, now: DateTime<Utc>) -> Result<Redemption> {
        let reward = find_reward(reward_id).ok_or_else(|| anyhow!("unknown reward {reward_id}"))?;
        if !self.can_redeem(reward) {
            bail!(NOT_ENOUGH_POINTS_MESSAGE);
        }

        let redemption = Redemption {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            reward_id: reward.id,
            reward_name: reward.name.to_string(),
            points_spent: reward.points_required,
            redeemed_at: now,
        };

        if let Some(db) = &self.store {
            db.insert_redemption(&redemption).await?;
        }
        self.redemptions.insert(0, redemption.clone());
        Ok(redemption)
    }
}
