use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the submission creation time in epoch seconds.
pub const CREATED_UTC_FIELD: &str = "created_utc";

pub const DEFAULT_DEDUP_FIELD: &str = "title";

/// One fetched submission, kept as the raw JSON object returned by the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// One page of records returned by a single fetch.
pub type Batch = Vec<Record>;

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Creation time in seconds. Float timestamps are truncated.
    pub fn created_utc(&self) -> Option<i64> {
        let value = self.0.get(CREATED_UTC_FIELD)?;

        value
            .as_i64()
            .or_else(|| value.as_f64().map(|secs| secs as i64))
    }
}

/// Oldest `created_utc` in the batch, ignoring records without one.
pub fn oldest_created_utc(batch: &[Record]) -> Option<i64> {
    batch.iter().filter_map(Record::created_utc).min()
}

/// Selects the field records are deduplicated on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    field: String,
}

impl DedupKey {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Identity of the record under this key. A missing field maps to the same
    /// key as an explicit `null`.
    pub fn key_of(&self, record: &Record) -> String {
        match record.get(&self.field) {
            Some(value) => value.to_string(),
            None => Value::Null.to_string(),
        }
    }
}

impl Default for DedupKey {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_FIELD)
    }
}
