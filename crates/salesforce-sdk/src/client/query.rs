//! SOQL query support.

use serde::{Deserialize, Serialize};

/// One batch of SOQL query results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse<T> {
    pub total_size: u64,
    pub done: bool,
    pub records: Vec<T>,
}

impl<T> QueryResponse<T> {
    /// First record of the batch, if any.
    pub fn first(&self) -> Option<&T> {
        self.records.first()
    }

    pub fn into_first(self) -> Option<T> {
        self.records.into_iter().next()
    }
}

/// Escape a value for use inside a single-quoted SOQL string literal.
///
/// Backslashes are escaped before quotes so the escape characters added for
/// quotes are not doubled.
pub fn escape_soql_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
