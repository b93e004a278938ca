//! EXIF date string normalization
//!
//! The EXIF reading collaborator hands over whatever date string the
//! file carried; this module reduces it to a `YYYY-MM-DD` seed for the
//! default watermark text. Raw EXIF timestamps use `yyyy:MM:dd HH:mm:ss`;
//! ISO-prefixed strings pass through. Anything malformed yields `None`
//! and the caller falls back to a default watermark string.

use chrono::NaiveDate;

/// Normalize a raw EXIF or ISO date string to `YYYY-MM-DD`
pub fn normalize_date_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let prefix = trimmed.get(..10)?;
    if prefix.len() != 10 {
        return None;
    }
    let candidate = prefix.replace(':', "-");
    NaiveDate::parse_from_str(&candidate, "%Y-%m-%d").ok()?;
    Some(candidate)
}
