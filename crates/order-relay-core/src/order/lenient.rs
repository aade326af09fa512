//! Parsing of the `orderData` field.
//!
//! `orderData` arrives either as a JSON object or as a string. Strings are
//! usually JSON, but some senders emit Python dict literals
//! (`{'OrderId': 42, 'Paid': True}`), so a lenient second pass rewrites those
//! tokens before giving up.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

use super::OrderDataSource;

/// Why an `orderData` string could not be turned into a mapping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderDataParseError {
    #[error("orderData is neither JSON nor a dict literal: {message}")]
    Unparsable { message: String },

    #[error("orderData parsed to {kind} instead of an object")]
    NotAnObject { kind: &'static str },
}

fn literal_token_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            // Only tokens in value position: after a colon, comma or opening bracket.
            Regex::new(r"([:\[,]\s*)(True|False|None)\b").ok()
        })
        .as_ref()
}

/// Rewrite dict-literal syntax into JSON.
///
/// Single quotes become double quotes and bare `True`/`False`/`None`
/// become `true`/`false`/`null`.
pub fn lenient_transform(text: &str) -> String {
    let quoted = text.replace('\'', "\"");
    let Some(pattern) = literal_token_pattern() else {
        return quoted;
    };
    pattern
        .replace_all(&quoted, |caps: &regex::Captures<'_>| {
            let token = match &caps[2] {
                "True" => "true",
                "False" => "false",
                _ => "null",
            };
            format!("{}{}", &caps[1], token)
        })
        .into_owned()
}

/// Parse an `orderData` string, strictly first and then leniently.
pub fn parse_order_text(
    text: &str,
) -> Result<(Map<String, Value>, OrderDataSource), OrderDataParseError> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return into_object(value).map(|map| (map, OrderDataSource::JsonString));
    }

    let rewritten = lenient_transform(text);
    let value = serde_json::from_str::<Value>(&rewritten).map_err(|e| {
        OrderDataParseError::Unparsable {
            message: e.to_string(),
        }
    })?;
    into_object(value).map(|map| (map, OrderDataSource::LenientString))
}

fn into_object(value: Value) -> Result<Map<String, Value>, OrderDataParseError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(OrderDataParseError::NotAnObject {
            kind: kind_of(&other),
        }),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "lenient_tests.rs"]
mod tests;
