use super::error::{Result, StoreError};
use super::path::StorePath;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// Collections
// ============================================================================

/// Top-level collections the maintenance tools touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Loans,
    Matches,
    Managers,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Loans => "loans",
            Collection::Matches => "matches",
            Collection::Managers => "managers",
        }
    }

    pub fn path(&self) -> StorePath {
        StorePath::top_level(self.name())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Enumerate the records of a collection as `(key, record)` pairs.
///
/// The store hands collections back as objects, or as arrays (with `null`
/// holes) when every key is a small integer. Any other shape is reported as
/// a decode error against `path`.
pub fn collection_entries(path: &StorePath, value: Value) -> Result<Vec<(String, Value)>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| !item.is_null())
            .map(|(index, item)| (index.to_string(), item))
            .collect()),
        other => Err(StoreError::decode(
            path,
            format!("expected a collection, found {}", json_kind(&other)),
        )),
    }
}

/// Number of direct children under a node; a leaf has none.
///
/// Accepts either a full subtree or a shallow listing (`{"key": true, ...}`).
pub fn child_count(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.len(),
        Value::Array(items) => items.iter().filter(|item| !item.is_null()).count(),
        _ => 0,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Performance counters wiped by the season cleanup.
pub const COUNTER_FIELDS: [&str; 5] = ["points", "wins", "losses", "draws", "matchesPlayed"];

pub const BUDGET_FIELD: &str = "budget";

/// A registered player's profile as stored under `managers/{id}`.
///
/// Maintenance code works on raw JSON records so that unknown fields and
/// oddly-typed values survive untouched; this struct is the typed view used
/// when seeding stores and inspecting results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    #[serde(default)]
    pub manager_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub wins: u64,
    #[serde(default)]
    pub losses: u64,
    #[serde(default)]
    pub draws: u64,
    #[serde(default)]
    pub matches_played: u64,
}

impl Manager {
    pub fn new(manager_name: &str, email: &str) -> Self {
        Self {
            manager_name: manager_name.to_string(),
            email: email.to_string(),
            ..Self::default()
        }
    }

    pub fn budget(mut self, budget: i64) -> Self {
        self.budget = budget;
        self
    }

    /// Set points, wins, losses and draws; `matches_played` follows from them.
    pub fn record(mut self, points: u64, wins: u64, losses: u64, draws: u64) -> Self {
        self.points = points;
        self.wins = wins;
        self.losses = losses;
        self.draws = draws;
        self.matches_played = wins + losses + draws;
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| StoreError::decode("manager", e.to_string()))
    }
}

/// Field patch that zeroes every performance counter and nothing else.
pub fn counter_reset_patch() -> Map<String, Value> {
    COUNTER_FIELDS
        .iter()
        .map(|field| (field.to_string(), Value::from(0)))
        .collect()
}

/// Budget held by a raw manager record.
///
/// Integers are taken as-is, other numbers are truncated toward zero, and a
/// missing or non-numeric field counts as 0.
pub fn budget_of(record: &Map<String, Value>) -> i64 {
    match record.get(BUDGET_FIELD) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

pub fn manager_name_of(record: &Map<String, Value>) -> Option<String> {
    record
        .get("managerName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
