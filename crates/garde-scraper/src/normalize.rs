//! Phone and day-of-week normalization for extracted drafts.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use garde_core::{
    weekday_index, Coordinates, DraftRecord, NormalizedPharmacy, DEFAULT_ADDRESS, PHONE_SENTINEL,
};
use regex::Regex;

/// A digit followed by at least eight digits, spaces, hyphens or parentheses.
static PHONE_SHAPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d\s\-()]{8,}").expect("valid phone regex"));
// Leftmost run of phone characters that is not whitespace only.
static PHONE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\d\s\-()]*[\d\-()][\d\s\-()]*").expect("valid phone run regex")
});
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})[/\-](\d{1,2})[/\-](\d{2,4})").expect("valid date regex")
});

/// French names first, then English; both Sunday-first. The first entry
/// contained in the text wins.
const DAY_NAMES: [(&str, u8); 14] = [
    ("dimanche", 0),
    ("lundi", 1),
    ("mardi", 2),
    ("mercredi", 3),
    ("jeudi", 4),
    ("vendredi", 5),
    ("samedi", 6),
    ("sunday", 0),
    ("monday", 1),
    ("tuesday", 2),
    ("wednesday", 3),
    ("thursday", 4),
    ("friday", 5),
    ("saturday", 6),
];

/// First phone-shaped substring of `text`, trimmed.
#[must_use]
pub fn find_phone_shaped(text: &str) -> Option<&str> {
    PHONE_SHAPED_RE.find(text).map(|m| m.as_str().trim())
}

/// Reduce free text to its phone digits and separators.
///
/// Returns the first run of digits, spaces, hyphens and parentheses, trimmed.
/// Text without such a run comes back trimmed but otherwise unchanged.
#[must_use]
pub fn normalize_phone(text: &str) -> String {
    PHONE_RUN_RE
        .find(text)
        .map_or_else(|| text.trim(), |m| m.as_str().trim())
        .to_string()
}

/// Resolve a 0..=6 (Sunday-first) weekday from free text.
///
/// A valid `D/M/Y` or `D-M-Y` date wins, then the first day name found in
/// the lowercased text, then `today`.
#[must_use]
pub fn resolve_day_of_week(text: &str, today: u8) -> u8 {
    if let Some(day) = weekday_from_date(text) {
        return day;
    }

    let lowered = text.to_lowercase();
    DAY_NAMES
        .iter()
        .find(|(name, _)| lowered.contains(name))
        .map_or(today, |(_, day)| *day)
}

fn weekday_from_date(text: &str) -> Option<u8> {
    let cap = DATE_RE.captures(text)?;
    let day: u32 = cap[1].parse().ok()?;
    let month: u32 = cap[2].parse().ok()?;
    let year_text = &cap[3];
    let mut year: i32 = year_text.parse().ok()?;
    if year_text.len() == 2 {
        year += 2000;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(weekday_index(date.weekday()))
}

/// Build a normalized pharmacy from a draft.
///
/// Empty addresses fall back to [`DEFAULT_ADDRESS`]; phones that normalize
/// to nothing become [`PHONE_SENTINEL`].
#[must_use]
pub fn normalize_draft(
    draft: DraftRecord,
    today: u8,
    coordinates: Option<Coordinates>,
) -> NormalizedPharmacy {
    let phone = normalize_phone(&draft.raw_phone_text);
    let address = draft.address.trim();

    NormalizedPharmacy {
        name: draft.name.trim().to_string(),
        address: if address.is_empty() {
            DEFAULT_ADDRESS.to_string()
        } else {
            address.to_string()
        },
        phone: if phone.is_empty() {
            PHONE_SENTINEL.to_string()
        } else {
            phone
        },
        coordinates,
        day_of_week: resolve_day_of_week(&draft.raw_day_text, today),
    }
}
