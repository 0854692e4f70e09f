//! Bar datetime parsing.
//!
//! The API reports bar datetimes as naive wall-clock strings in the request
//! timezone (`"2021-03-01 10:30:00"`, or `"2021-03-01"` for daily bars). They
//! are resolved to UTC here. RFC-3339 strings with an explicit offset are
//! accepted too.
//!
//! Around DST changes a wall time can be ambiguous (fall-back) or not exist
//! (spring-forward). Bars are never dropped for that: ambiguous times take
//! the earlier instant and skipped times are shifted forward to the first
//! valid minute.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Policy for DST edge cases when resolving a local wall time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DstPolicy {
    /// No answer for ambiguous or nonexistent local times.
    Strict,
    /// Ambiguous: the earlier instant. Nonexistent: step forward minute by
    /// minute (at most two hours) to the first valid instant.
    Lenient,
}

/// Parse a bar datetime reported in `tz` into UTC.
pub fn parse_bar_datetime(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    from_local_naive(naive, tz, DstPolicy::Lenient)
}

/// Resolve a naive local timestamp in `tz` to UTC under `policy`.
pub fn from_local_naive(naive: NaiveDateTime, tz: Tz, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match (tz.from_local_datetime(&naive), policy) {
        (LocalResult::Single(dt), _) => Some(dt.with_timezone(&Utc)),
        (LocalResult::Ambiguous(earliest, _), DstPolicy::Lenient) => {
            Some(earliest.with_timezone(&Utc))
        }
        (LocalResult::None, DstPolicy::Lenient) => (1..=120).find_map(|minutes| {
            match tz.from_local_datetime(&(naive + Duration::minutes(minutes))) {
                LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
                _ => None,
            }
        }),
        _ => None,
    }
}
