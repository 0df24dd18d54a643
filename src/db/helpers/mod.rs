use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::models::{EntryOrigin, WasteCategory};

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_category(value: &str) -> Result<WasteCategory> {
    WasteCategory::parse(value).ok_or_else(|| anyhow!("unknown waste category {value}"))
}

pub fn parse_origin(value: &str) -> Result<EntryOrigin> {
    EntryOrigin::parse(value).ok_or_else(|| anyhow!("unknown entry origin {value}"))
}
