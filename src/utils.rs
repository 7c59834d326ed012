use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::path::Path;

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

/// Current time as a fixed-width RFC 3339 string, so lexical order matches
/// chronological order in SQL `ORDER BY`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
