//! Epoch-millisecond <-> local civil date-time conversion.
//!
//! Stored values are UTC instants in milliseconds; domain values are
//! `NaiveDateTime` in the zone that is local *at conversion time*. A value
//! written before and read after a zone change therefore shifts.
//!
//! # Invariants
//! - `from_epoch_millis(to_epoch_millis(t)) == t` for millisecond-precise
//!   `t` while the zone is unchanged and `t` is not inside a DST gap.
//! - Sub-millisecond precision is truncated on write.

use crate::repo::{RepoError, RepoResult};
use chrono::{Duration, LocalResult, NaiveDateTime, Offset, TimeZone};

/// Converts a local civil date-time into epoch milliseconds.
pub fn to_epoch_millis(value: NaiveDateTime) -> i64 {
    to_epoch_millis_in(&chrono::Local, value)
}

/// Converts epoch milliseconds into a local civil date-time.
pub fn from_epoch_millis(millis: i64) -> RepoResult<NaiveDateTime> {
    from_epoch_millis_in(&chrono::Local, millis)
}

/// Current local civil time.
pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Current instant in epoch milliseconds.
pub fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Zone-explicit variant of [`to_epoch_millis`].
///
/// Ambiguous times (DST overlap) resolve to the earlier instant. Times that
/// do not exist (DST gap) are read with the offset in force before the
/// transition, which lands them after the gap.
pub fn to_epoch_millis_in<Tz: TimeZone>(tz: &Tz, value: NaiveDateTime) -> i64 {
    match tz.from_local_datetime(&value) {
        LocalResult::Single(instant) => instant.timestamp_millis(),
        LocalResult::Ambiguous(earliest, _) => earliest.timestamp_millis(),
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(value - Duration::days(1)))
                .fix();
            (value - Duration::seconds(i64::from(before.local_minus_utc())))
                .and_utc()
                .timestamp_millis()
        }
    }
}

/// Zone-explicit variant of [`from_epoch_millis`].
pub fn from_epoch_millis_in<Tz: TimeZone>(tz: &Tz, millis: i64) -> RepoResult<NaiveDateTime> {
    tz.timestamp_millis_opt(millis)
        .single()
        .map(|instant| instant.naive_local())
        .ok_or_else(|| {
            RepoError::InvalidData(format!("epoch millis `{millis}` out of representable range"))
        })
}
