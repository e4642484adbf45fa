//! Business-hours arithmetic.
//!
//! Durations are measured on local wall-clock time: both endpoints are
//! converted to the configured zone and the overlap with the opening window of
//! every weekday in between is summed.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusinessHours {
    pub timezone: Tz,
    pub opens: NaiveTime,
    pub closes: NaiveTime,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Sao_Paulo,
            opens: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            closes: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl BusinessHours {
    pub fn new(timezone: Tz, opens: NaiveTime, closes: NaiveTime) -> Self {
        Self { timezone, opens, closes }
    }

    pub fn local(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        ts.with_timezone(&self.timezone).naive_local()
    }

    /// Calendar day of `ts` in the reporting zone.
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        self.local(ts).date()
    }

    /// Seconds of `[start, end]` that fall inside business hours, or `None`
    /// when either endpoint is unknown.
    pub fn seconds_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Option<f64> {
        Some(self.overlap_seconds(self.local(start?), self.local(end?)))
    }

    /// Overlap of a local interval with the Mon-Fri opening window.
    /// An interval that ends before it starts has no overlap.
    pub fn overlap_seconds(&self, start: NaiveDateTime, end: NaiveDateTime) -> f64 {
        let last_day = end.date();
        let micros: i64 = start
            .date()
            .iter_days()
            .take_while(|day| *day <= last_day)
            .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
            .map(|day| {
                let from = start.max(day.and_time(self.opens));
                let to = end.min(day.and_time(self.closes));
                if to > from {
                    (to - from).num_microseconds().unwrap_or(0)
                } else {
                    0
                }
            })
            .sum();

        micros as f64 / 1_000_000.0
    }
}
