//! Assigns events to day cells or week rows.
//!
//! Events lasting at most one day belong to the cell of the day they start
//! on. Longer events belong to every week they overlap. Calendar dates are
//! taken in the supplied time zone.

use chrono::{NaiveDate, TimeZone};

use super::week_end;
use crate::models::Event;

fn local_date<Tz: TimeZone>(t: &chrono::DateTime<chrono::Utc>, tz: &Tz) -> NaiveDate {
    t.with_timezone(tz).date_naive()
}

/// Events of at most one day starting on `date`.
pub fn events_for_day<'a, Tz: TimeZone>(
    events: &'a [Event],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|e| !e.is_week_long() && local_date(&e.start_time, tz) == date)
        .collect()
}

/// Events longer than one day overlapping `[week_start, week_start + 6]`,
/// earliest first.
pub fn events_for_week<'a, Tz: TimeZone>(
    events: &'a [Event],
    week_start: NaiveDate,
    tz: &Tz,
) -> Vec<&'a Event> {
    let week_end = week_end(week_start);
    let mut found: Vec<&Event> = events
        .iter()
        .filter(|e| {
            e.is_week_long()
                && local_date(&e.start_time, tz) <= week_end
                && local_date(&e.end_time, tz) >= week_start
        })
        .collect();
    found.sort_by_key(|e| e.start_time);
    found
}
