//! Timestamp utilities

use chrono::{DateTime, SubsecRound, Utc};

/// Current UTC timestamp at microsecond precision (the stored precision)
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Current UTC timestamp, guaranteed to be strictly later than `previous`
///
/// Recency ordering of library items relies on distinct `updated_at` values,
/// so an edit made within the clock's resolution still sorts ahead.
pub fn now_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}
