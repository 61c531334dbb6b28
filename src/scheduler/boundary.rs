//! Twice-daily refresh boundaries (00:00 and 12:00 local time)

use chrono::{DateTime, Duration as ChronoDuration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use std::time::Duration;

/// The next 00:00 or 12:00 strictly after `now`, in `now`'s own zone.
///
/// Before noon the target is today at 12:00; from 12:00:00 onward it is
/// tomorrow at 00:00, so a boundary is never its own successor.
pub fn next_boundary<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let local = now.naive_local();
    let midnight = local.date().and_time(NaiveTime::MIN);

    let target = if local.hour() < 12 {
        midnight + ChronoDuration::hours(12)
    } else {
        midnight + ChronoDuration::days(1)
    };

    resolve_local(&now.timezone(), target)
}

/// Time remaining until the next boundary
pub fn delay_to_next_boundary<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    next_boundary(now)
        .signed_duration_since(now.clone())
        .to_std()
        .unwrap_or(Duration::ZERO)
}

// Ambiguous wall times take the earlier instant; wall times skipped by a
// DST jump move forward to the first one that exists.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    let mut candidate = naive;
    for _ in 0..24 * 4 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => candidate += ChronoDuration::minutes(15),
        }
    }
    tz.from_utc_datetime(&naive)
}
