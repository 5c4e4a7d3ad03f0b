//! Utility functions for date formatting, log truncation, and file system checks.
//!
//! This module provides helper functions used throughout the crate:
//! - Publication date parsing and the site's display formats
//! - String truncation for logging backend responses
//! - File system validation for output locations

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Display formats used on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `Mar 4, 2025`, used on article cards.
    Short,
    /// `March 4, 2025`, used on article pages and newsletters.
    Long,
    /// `March 2025`, used on print issues.
    MonthYear,
}

impl DateStyle {
    fn pattern(self) -> &'static str {
        match self {
            DateStyle::Short => "%b %-d, %Y",
            DateStyle::Long => "%B %-d, %Y",
            DateStyle::MonthYear => "%B %Y",
        }
    }
}

/// Parse a backend date value.
///
/// Accepts RFC 3339 timestamps (`2025-03-04T15:00:00Z`), naive timestamps
/// (`2025-03-04T15:00:00`), and plain dates (`2025-03-04`). Timestamps keep
/// the calendar date of their own offset.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Format a backend date value, or `None` if it cannot be parsed.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_date("2025-03-04", DateStyle::Short).as_deref(), Some("Mar 4, 2025"));
/// ```
pub fn format_date(raw: &str, style: DateStyle) -> Option<String> {
    parse_date(raw).map(|d| d.format(style.pattern()).to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary at or below `max` bytes,
/// with an ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure the parent directory of an output file exists and is writable.
///
/// The directory is created if missing, then a probe file is written and
/// removed again.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_parent(path: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = dir.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}
