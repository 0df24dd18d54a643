use anyhow::{Context, Result};
use rusqlite::params;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, to_i64, to_u64},
};
use crate::models::Redemption;

impl Database {
    pub async fn insert_redemption(&self, redemption: &Redemption) -> Result<()> {
        let record = redemption.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO redemptions (id, user_id, reward_id, reward_name, points_spent, redeemed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.user_id,
                    record.reward_id,
                    record.reward_name,
                    to_i64(record.points_spent)?,
                    record.redeemed_at.to_rfc3339(),
                ],
            )
            .with_context(|| "failed to insert redemption")?;
            Ok(())
        })
        .await
    }

    /// Redemptions for a user, most recent first.
    pub async fn list_redemptions(&self, user_id: &str) -> Result<Vec<Redemption>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, reward_id, reward_name, points_spent, redeemed_at
                 FROM redemptions
                 WHERE user_id = ?1
                 ORDER BY seq DESC",
            )?;

            let mut rows = stmt.query(params![user_id])?;
            let mut redemptions = Vec::new();
            while let Some(row) = rows.next()? {
                let points_spent: i64 = row.get(4)?;
                let redeemed_at: String = row.get(5)?;
                redemptions.push(Redemption {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    reward_id: row.get(2)?,
                    reward_name: row.get(3)?,
                    points_spent: to_u64(points_spent, "points_spent")?,
                    redeemed_at: parse_datetime(&redeemed_at, "redeemed_at")?,
                });
            }

            Ok(redemptions)
        })
        .await
    }
}
