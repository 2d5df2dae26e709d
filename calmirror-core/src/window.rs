//! Time window for event queries.

use std::fmt;

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{CalMirrorError, CalMirrorResult};

/// Half-open window `[min, max)` passed to calendar queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(min: DateTime<Utc>, max: DateTime<Utc>) -> Self {
        TimeWindow { min, max }
    }

    /// From local midnight of `now`'s date to the same midnight `months` later.
    pub fn look_ahead<Tz: TimeZone>(now: &DateTime<Tz>, months: u32) -> CalMirrorResult<Self> {
        let tz = now.timezone();
        let today = now.date_naive();
        let until = today
            .checked_add_months(Months::new(months))
            .ok_or_else(|| CalMirrorError::Config(format!("Window of {months} months overflows")))?;

        Ok(TimeWindow {
            min: local_midnight(&tz, today)?,
            max: local_midnight(&tz, until)?,
        })
    }

    /// Whether an event spanning `[start, end)` (epoch millis) overlaps the window.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        start < self.max.timestamp_millis() && end > self.min.timestamp_millis()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.min.to_rfc3339(), self.max.to_rfc3339())
    }
}

/// First instant of `date` in `tz`.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> CalMirrorResult<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CalMirrorError::Config(format!("Invalid date {date}")))?;

    first_valid_local(tz, naive)
        .ok_or_else(|| CalMirrorError::Config(format!("No valid local midnight for {date}")))
}

/// `naive` in `tz`, or the first valid local time after it.
///
/// A wall-clock time inside a DST gap does not exist, so walk forward in
/// 30 minute steps until one resolves.
pub(crate) fn first_valid_local<Tz: TimeZone>(
    tz: &Tz,
    mut naive: NaiveDateTime,
) -> Option<DateTime<Utc>> {
    for _ in 0..4 {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return Some(dt.with_timezone(&Utc));
        }
        naive += chrono::Duration::minutes(30);
    }
    None
}
