use serde_json::{Map, Value};

use crate::scoring::sanitize;

pub const UNKNOWN_LABEL: &str = "Unknown";

const LABEL_KEYS: [&str; 3] = ["type", "wasteType", "category"];

/// Typed view of one feed message.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPayload {
    pub weight: f64,
    pub label: String,
}

impl Default for FeedPayload {
    fn default() -> Self {
        Self {
            weight: 0.0,
            label: UNKNOWN_LABEL.to_string(),
        }
    }
}

impl FeedPayload {
    /// Accepts a flat `{weight, type}` object or one level of nesting
    /// (`{"sensor": {weight, type}}`). Missing or malformed fields fall back to
    /// zero weight and the `Unknown` label; this never fails.
    pub fn parse(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        if let Some(payload) = from_fields(object) {
            return payload;
        }

        object
            .values()
            .filter_map(Value::as_object)
            .find_map(from_fields)
            .unwrap_or_default()
    }

    pub fn parse_str(raw: &str) -> Self {
        serde_json::from_str::<Value>(raw)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }
}

fn from_fields(object: &Map<String, Value>) -> Option<FeedPayload> {
    let weight = object.get("weight").and_then(parse_weight);
    let label = LABEL_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|label| !label.is_empty());

    if weight.is_none() && label.is_none() {
        return None;
    }

    Some(FeedPayload {
        weight: weight.unwrap_or(0.0),
        label: label.unwrap_or(UNKNOWN_LABEL).to_string(),
    })
}

fn parse_weight(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
    .map(sanitize)
}
