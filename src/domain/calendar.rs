//! Local-day arithmetic for streaks, daily goals and league weeks.
//!
//! The product runs in a single timezone. Every "today", "yesterday" and
//! "this week" question is answered through a [`LocalCalendar`] so the
//! offset is configured in exactly one place.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Default offset: UTC-06:00 (Mexico City, no DST since 2022).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -360;

/// Calendar bound to a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCalendar {
    offset: FixedOffset,
}

impl LocalCalendar {
    /// Creates a calendar for the given offset.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Creates a calendar from an offset in minutes east of UTC.
    ///
    /// Returns `None` when the offset is outside ±24h.
    #[must_use]
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    /// Returns the configured offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Local calendar date of the instant `now`.
    #[must_use]
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// The local date before `date`.
    #[must_use]
    pub fn yesterday(date: NaiveDate) -> NaiveDate {
        date.pred_opt().unwrap_or(date)
    }

    /// Monday-start week containing `now`, as inclusive local dates.
    #[must_use]
    pub fn week_bounds(&self, now: DateTime<Utc>) -> (NaiveDate, NaiveDate) {
        let today = self.local_date(now);
        let from_monday = u64::from(today.weekday().num_days_from_monday());
        let start = today.checked_sub_days(Days::new(from_monday)).unwrap_or(today);
        let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
        (start, end)
    }

    /// UTC instants of local midnight at `date` and at the following day.
    #[must_use]
    pub fn day_range_utc(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        (self.midnight_utc(date), self.midnight_utc(next))
    }

    fn midnight_utc(&self, date: NaiveDate) -> DateTime<Utc> {
        let naive = date.and_time(chrono::NaiveTime::MIN);
        // A fixed offset has no gaps, so the mapping is always single.
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map_or_else(|| naive.and_utc(), |local| local.with_timezone(&Utc))
    }
}

impl Default for LocalCalendar {
    fn default() -> Self {
        Self::from_offset_minutes(DEFAULT_UTC_OFFSET_MINUTES)
            .unwrap_or_else(|| Self::new(Utc.fix()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        let Ok(dt) = DateTime::parse_from_rfc3339(s) else {
            panic!("bad timestamp {s}");
        };
        dt.with_timezone(&Utc)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        let Some(date) = NaiveDate::from_ymd_opt(y, m, d) else {
            panic!("bad date");
        };
        date
    }

    #[test]
    fn local_date_applies_offset() {
        let cal = LocalCalendar::default();
        // 03:00 UTC is still the previous evening at UTC-6.
        assert_eq!(cal.local_date(utc("2026-03-10T03:00:00Z")), date(2026, 3, 9));
        assert_eq!(cal.local_date(utc("2026-03-10T06:00:00Z")), date(2026, 3, 10));
    }

    #[test]
    fn week_starts_on_monday() {
        let cal = LocalCalendar::default();
        // Sunday 2026-03-15 local.
        let (start, end) = cal.week_bounds(utc("2026-03-15T18:00:00Z"));
        assert_eq!(start, date(2026, 3, 9));
        assert_eq!(end, date(2026, 3, 15));

        // Monday 2026-03-16 00:30 local.
        let (start, _) = cal.week_bounds(utc("2026-03-16T06:30:00Z"));
        assert_eq!(start, date(2026, 3, 16));
    }

    #[test]
    fn day_range_is_local_midnight_to_midnight() {
        let cal = LocalCalendar::default();
        let (start, end) = cal.day_range_utc(date(2026, 3, 10));
        assert_eq!(start, utc("2026-03-10T06:00:00Z"));
        assert_eq!(end, utc("2026-03-11T06:00:00Z"));
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        assert!(LocalCalendar::from_offset_minutes(24 * 60).is_none());
        assert!(LocalCalendar::from_offset_minutes(330).is_some());
    }
}
