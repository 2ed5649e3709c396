//! Field coercion rules shared by the record handlers.
//!
//! Normalization never fails: a value that cannot be coerced degrades to
//! `None` (or a documented default), and the per-kind required-field check
//! decides whether the record proceeds or is skipped.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

/// Parse a date field. Accepts `YYYY-MM-DD` verbatim and a bare 4-digit
/// year, which expands to January 1st of that year. Anything else is `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if YEAR_RE.is_match(raw) {
        let year: i32 = raw.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Normalize a rating to the store's bounded scale: clamped to [0.0, 9.9]
/// and rounded to one decimal place.
///
/// Accepted encodings: a bare number, a `num/den` fraction (scaled to
/// 0-10; an empty denominator means 10), and a percentage suffix. A bare
/// number above 10 and at most 100 is reinterpreted as percentage-scale.
pub fn parse_rating(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let value = if raw.contains('/') {
        let mut parts = raw.split('/');
        let num: f64 = parts.next()?.trim().parse().ok()?;
        let den = parts.next()?.trim();
        let den: f64 = if den.is_empty() { 10.0 } else { den.parse().ok()? };
        if den == 0.0 {
            return None;
        }
        num / den * 10.0
    } else if let Some(pct) = raw.strip_suffix('%') {
        pct.trim().parse::<f64>().ok()? / 10.0
    } else {
        let value: f64 = raw.parse().ok()?;
        if value > 10.0 && value <= 100.0 {
            value / 10.0
        } else {
            value
        }
    };
    Some((value.clamp(0.0, 9.9) * 10.0).round() / 10.0)
}

/// Season numbers default to 1 when absent or unparseable.
pub fn parse_season(raw: Option<&str>) -> i32 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(1)
}

/// Episode numbers default to none when absent or unparseable.
pub fn parse_episode_number(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Donation amounts default to zero when absent or unparseable.
pub fn parse_amount(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(0.0)
}

/// Ages default to none when absent or unparseable.
pub fn parse_age(raw: Option<&str>) -> Option<i32> {
    raw.and_then(|s| s.trim().parse().ok())
}
