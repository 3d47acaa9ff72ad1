//! The shared result accumulator.
//!
//! Validation never fails fast: every step appends to one [`Results`]
//! so a caller sees all violations of a pass at once. Entries carry a
//! severity level; only errors make the accumulator not-OK.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Severity of one result entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Error,
    Warning,
    Trace,
}

/// One diagnostic produced during a validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub level: Level,
    /// Field name or operation that produced the entry.
    pub source: String,
    pub message: String,
    /// The value under inspection when the entry was recorded.
    pub value: Value,
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            Level::Error => "ERROR",
            Level::Warning => "WARNING",
            Level::Trace => "TRACE",
        };
        write!(f, "{}: {}: {} ({})", level, self.source, self.message, self.value)
    }
}

/// Accumulated validation results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
pub struct Results {
    entries: Vec<Entry>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, source: impl Into<String>, message: impl Into<String>, value: Value) {
        self.push(Level::Error, source, message, value);
    }

    pub fn warning(&mut self, source: impl Into<String>, message: impl Into<String>, value: Value) {
        self.push(Level::Warning, source, message, value);
    }

    pub fn trace(&mut self, source: impl Into<String>, message: impl Into<String>, value: Value) {
        self.push(Level::Trace, source, message, value);
    }

    fn push(
        &mut self,
        level: Level,
        source: impl Into<String>,
        message: impl Into<String>,
        value: Value,
    ) {
        self.entries.push(Entry {
            level,
            source: source.into(),
            message: message.into(),
            value,
        });
    }

    /// True while no error-level entry has been recorded.
    pub fn is_ok(&self) -> bool {
        self.entries
            .iter()
            .all(|entry| entry.level != Level::Error)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn errors(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|entry| entry.level == Level::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Whether any error was recorded against `source`.
    pub fn has_errors_for(&self, source: &str) -> bool {
        self.errors().any(|entry| entry.source == source)
    }

    pub fn merge(&mut self, other: Results) {
        self.entries.extend(other.entries);
    }
}

impl fmt::Display for Results {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "no validation results");
        }
        write!(f, "{} validation result(s):", self.entries.len())?;
        for entry in &self.entries {
            write!(f, "\n  {entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn warnings_and_traces_do_not_fail_the_pass() {
        let mut results = Results::new();
        results.warning("name", "converted", json!("abc"));
        results.trace("name", "checked", json!("abc"));
        assert!(results.is_ok());

        results.error("name", "too short", json!("abc"));
        assert!(!results.is_ok());
        assert_eq!(results.error_count(), 1);
        assert_eq!(results.entries().len(), 3);
    }

    #[test]
    fn errors_are_tracked_per_source() {
        let mut results = Results::new();
        results.error("email", "bad format", json!("x"));
        assert!(results.has_errors_for("email"));
        assert!(!results.has_errors_for("name"));
    }

    #[test]
    fn merge_concatenates_entries() {
        let mut first = Results::new();
        first.error("a", "one", Value::Null);
        let mut second = Results::new();
        second.error("b", "two", Value::Null);
        first.merge(second);
        assert_eq!(first.error_count(), 2);
    }
}
