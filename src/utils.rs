//! Helpers for file naming, timestamp parsing, logging and output directories.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Reduce a title to a file stem.
///
/// Every character that is not an ASCII letter, digit or space is dropped,
/// then the spaces are dropped too. Distinct titles may collapse to the same
/// stem; callers deal with the collision.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_file_stem("Fire in B.C.: 3 dead"), "FireinBC3dead");
/// ```
pub fn sanitize_file_stem(title: &str) -> String {
    title.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Parse the `datetime` attribute of a result card into a calendar date.
///
/// The site emits UTC timestamps like `2024-03-05T14:22:10.000Z`; plain
/// RFC 3339 with an offset is accepted as well.
pub fn parse_published_at(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.fZ")
        .map(|dt| dt.date())
        .or_else(|_| DateTime::parse_from_rfc3339(timestamp).map(|dt| dt.date_naive()))
        .ok()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with the number of dropped
/// characters appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max).collect();
        format!("{}…(+{} chars)", kept, total - max)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
