// extractor/src/parser.rs
//!
//! Turns free-form model output into asset records.
//!
//! The model is asked for a JSON array but often wraps it in prose or a
//! markdown fence. Extraction tries a fenced block first and falls back to the
//! widest bracket span. Records that decode but fail validation are dropped
//! one by one; only a missing or undecodable array fails the whole response.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::schemas::AssetRecord;
use crate::{ExtractError, MalformedReason, Result};

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// Greedy span from the first `[` to the last `]`.
pub fn bracket_span(raw: &str) -> Option<&str> {
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    (end > start).then(|| &raw[start..=end])
}

/// Locate and decode the JSON array of objects in `raw`.
pub fn extract_json_array(raw: &str) -> std::result::Result<Vec<Map<String, Value>>, MalformedReason> {
    for captures in FENCED_BLOCK.captures_iter(raw) {
        let body = captures.get(1).map_or("", |m| m.as_str()).trim();
        if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(body) {
            debug!(items = items.len(), "decoded fenced JSON block");
            return into_objects(items);
        }
    }

    let span = bracket_span(raw).ok_or(MalformedReason::NoJsonArray)?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Array(items)) => into_objects(items),
        Ok(_) => Err(MalformedReason::NotArrayOfObjects),
        Err(err) => Err(MalformedReason::Decode(err.to_string())),
    }
}

fn into_objects(items: Vec<Value>) -> std::result::Result<Vec<Map<String, Value>>, MalformedReason> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(object) => Ok(object),
            _ => Err(MalformedReason::NotArrayOfObjects),
        })
        .collect()
}

/// Validate decoded objects and stamp the source filename on each record.
pub fn records_from_objects(objects: &[Map<String, Value>], filename: &str) -> Vec<AssetRecord> {
    objects
        .iter()
        .enumerate()
        .filter_map(|(idx, object)| match AssetRecord::from_json_object(object) {
            Ok(mut record) => {
                record.set_filename(filename);
                Some(record)
            }
            Err(err) => {
                warn!(filename, index = idx, error = %err, "dropping invalid record");
                None
            }
        })
        .collect()
}

/// Parse one model response into records for `filename`.
pub fn parse_records(raw: &str, filename: &str) -> Result<Vec<AssetRecord>> {
    let objects = extract_json_array(raw).map_err(ExtractError::MalformedOutput)?;
    Ok(records_from_objects(&objects, filename))
}
