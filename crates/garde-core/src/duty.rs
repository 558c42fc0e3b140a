//! Duty status: which pharmacies are the guard pharmacy for a given weekday.

use chrono::{DateTime, Datelike, Duration, SubsecRound, Utc, Weekday};

use crate::pharmacies::{NewPharmacy, NormalizedPharmacy};

/// The current instant truncated to microseconds, the precision Postgres
/// `timestamptz` keeps.
#[must_use]
pub fn stamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Sunday-first weekday number, 0..=6.
#[must_use]
pub fn weekday_index(weekday: Weekday) -> u8 {
    // num_days_from_sunday is always in 0..=6
    #[allow(clippy::cast_possible_truncation)]
    let day = weekday.num_days_from_sunday() as u8;
    day
}

/// Weekday of `now` shifted by the local UTC offset.
#[must_use]
pub fn reference_day(now: DateTime<Utc>, utc_offset_minutes: i32) -> u8 {
    let local = now + Duration::minutes(i64::from(utc_offset_minutes));
    weekday_index(local.weekday())
}

#[must_use]
pub fn is_on_duty(day_of_week: u8, reference_day: u8) -> bool {
    day_of_week == reference_day
}

/// Turn normalized pharmacies into records ready for a bulk replace.
///
/// `is_open` is a snapshot against `reference_day`; every record shares the
/// `resolved_at` stamp.
#[must_use]
pub fn resolve_duty(
    pharmacies: Vec<NormalizedPharmacy>,
    reference_day: u8,
    resolved_at: DateTime<Utc>,
) -> Vec<NewPharmacy> {
    pharmacies
        .into_iter()
        .map(|p| NewPharmacy {
            is_open: is_on_duty(p.day_of_week, reference_day),
            latitude: p.coordinates.map(|c| c.latitude),
            longitude: p.coordinates.map(|c| c.longitude),
            name: p.name,
            address: p.address,
            phone: p.phone,
            day_of_week: p.day_of_week,
            updated_at: resolved_at,
        })
        .collect()
}
