//! Client-side equality filtering of fetched records.

use serde::Serialize;

use crate::models::Record;

/// Keeps records whose `field` equals `expected`, ignoring case.
///
/// Records where the field is missing or not a string never match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFilter {
    pub field: String,
    pub expected: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }

    /// Articles in a given newspaper section.
    pub fn section(section: &str) -> Self {
        Self::new("sectionCategory", section)
    }

    /// Articles by a given author.
    pub fn author(author: &str) -> Self {
        Self::new("authorName", author)
    }

    pub fn matches(&self, record: &Record) -> bool {
        record
            .text(&self.field)
            .is_some_and(|value| value.to_lowercase() == self.expected.to_lowercase())
    }

    /// Retain only matching records, preserving order.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
