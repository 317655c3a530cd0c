//! Week arithmetic: Monday-start weeks, week ranges, week index within a cycle.
//!
//! Counting is done on calendar dates (`NaiveDate`), never on elapsed
//! milliseconds, so a DST shift inside a week cannot skew a week count.

use anyhow::Result;
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

/// Monday on or before `date`. Sunday belongs to the week of the preceding Monday.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(back)
}

/// Sunday closing the week that contains `date`.
pub fn week_sunday(date: NaiveDate) -> NaiveDate {
    week_monday(date) + Duration::days(6)
}

/// Monday 00:00:00.000 local time of the week containing `dt`.
pub fn start_of_week_monday<Z: TimeZone>(dt: &DateTime<Z>) -> DateTime<Z> {
    let monday = week_monday(dt.date_naive());
    resolve_local(&dt.timezone(), monday.and_time(NaiveTime::MIN))
}

/// Sunday 23:59:59.999 local time of the week containing `dt`.
pub fn end_of_week_sunday<Z: TimeZone>(dt: &DateTime<Z>) -> DateTime<Z> {
    let sunday = week_sunday(dt.date_naive());
    let last_ms = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    resolve_local(&dt.timezone(), sunday.and_time(last_ms))
}

/// Whole weeks from the week of `a` to the week of `b`. Negative when `b` is earlier.
pub fn weeks_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (week_monday(b) - week_monday(a)).num_days().div_euclid(7)
}

/// Position of `week` inside a repeating cycle of `cycle_length` weeks that
/// starts at `anchor`. Always in `0..cycle_length`, also for weeks before the anchor.
pub fn week_index_in_cycle(anchor: NaiveDate, week: NaiveDate, cycle_length: usize) -> usize {
    if cycle_length == 0 {
        return 0;
    }
    weeks_between(anchor, week).rem_euclid(cycle_length as i64) as usize
}

/// Parse a calendar date like "2025-01-06".
pub fn parse_week_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

/// Calendar date of a UTC instant as seen in an IANA zone like "America/Chicago".
pub fn local_date(at: DateTime<Utc>, tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(at.with_timezone(&tz).date_naive())
}

// Local midnight can fall into a DST gap in a few zones; take the first valid
// instant after it in that case.
fn resolve_local<Z: TimeZone>(tz: &Z, ndt: NaiveDateTime) -> DateTime<Z> {
    match tz.from_local_datetime(&ndt) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(ndt + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&ndt)),
    }
}
