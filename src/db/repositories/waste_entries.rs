use anyhow::{Context, Result};
use rusqlite::{params, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_category, parse_datetime, parse_origin, to_i64, to_u64},
};
use crate::models::WasteEntry;

fn row_to_entry(row: &Row) -> Result<WasteEntry> {
    let timestamp: String = row.get("timestamp")?;
    let category: String = row.get("category")?;
    let origin: String = row.get("origin")?;
    let points: i64 = row.get("eco_points_earned")?;

    Ok(WasteEntry::restore(
        row.get("id")?,
        row.get("user_id")?,
        parse_datetime(&timestamp, "timestamp")?,
        row.get("wet_waste_grams")?,
        row.get("dry_waste_grams")?,
        parse_category(&category)?,
        parse_origin(&origin)?,
        row.get("source_label")?,
        to_u64(points, "eco_points_earned")?,
    ))
}

impl Database {
    pub async fn insert_waste_entry(&self, entry: &WasteEntry) -> Result<()> {
        let record = entry.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO waste_entries (
                    id,
                    user_id,
                    timestamp,
                    wet_waste_grams,
                    dry_waste_grams,
                    category,
                    origin,
                    source_label,
                    eco_points_earned
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id(),
                    record.user_id(),
                    record.timestamp().to_rfc3339(),
                    record.wet_waste_grams(),
                    record.dry_waste_grams(),
                    record.category().as_str(),
                    record.origin().as_str(),
                    record.source_label(),
                    to_i64(record.eco_points_earned())?,
                ],
            )
            .with_context(|| format!("failed to insert waste entry {}", record.id()))?;
            Ok(())
        })
        .await
    }

    /// All entries for a user in the order they were appended.
    pub async fn list_waste_entries(&self, user_id: &str) -> Result<Vec<WasteEntry>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, timestamp, wet_waste_grams, dry_waste_grams,
                        category, origin, source_label, eco_points_earned
                 FROM waste_entries
                 WHERE user_id = ?1
                 ORDER BY seq ASC",
            )?;

            let mut rows = stmt.query(params![user_id])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }

            Ok(entries)
        })
        .await
    }
}
