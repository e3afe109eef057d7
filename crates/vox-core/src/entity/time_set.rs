//! Recurring time expressions.
//!
//! Supported TIMEX forms:
//!
//! | Form | Meaning |
//! |---|---|
//! | `THH[:MM[:SS]]`, `XXXX-XX-XXTHH[:MM[:SS]]` | every day at a time |
//! | `XXXX-WXX-d[THH[:MM[:SS]]]` | every weekday `d` (1 = Monday) at a time, midnight by default |
//! | `(A,B,PTnH)` | every hour from `A` while before `B`; `A` and `B` share a form and `n` must equal `B - A` |
//!
//! `"(XXXX-WXX-1T14,XXXX-WXX-1T18,PT4H)"` reads "every Monday, 14:00 to 18:00".

use std::fmt;

use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
    Weekday,
};

use super::convert::to_timedelta;
use crate::error::{EntityError, EntityResult};

/// How often a [`TimeSet`] repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
}

/// Bound on the number of occurrences produced by [`TimeSet::occurrences`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most this many occurrences.
    Count(usize),
    /// Occurrences up to and including this instant.
    Until(DateTime<FixedOffset>),
    /// Occurrences until the calendar runs out.
    Unbounded,
}

/// A parsed recurrence rule anchored to a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSet {
    timex: String,
    tz: FixedOffset,
    frequency: Frequency,
    weekday: Option<Weekday>,
    slots: Vec<NaiveTime>,
}

struct Point {
    weekday: Option<Weekday>,
    time: Option<NaiveTime>,
}

impl TimeSet {
    pub fn parse(timex: &str, tz: FixedOffset) -> EntityResult<Self> {
        let (weekday, slots) = match timex.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            Some(inner) => parse_range(timex, inner)?,
            None => {
                let point = parse_point(timex, timex)?;
                let time = match (point.weekday, point.time) {
                    (_, Some(time)) => time,
                    (Some(_), None) => NaiveTime::default(),
                    (None, None) => return Err(EntityError::time_set(timex, "missing time of day")),
                };
                (point.weekday, vec![time])
            }
        };

        Ok(Self {
            timex: timex.to_string(),
            tz,
            frequency: if weekday.is_some() {
                Frequency::Weekly
            } else {
                Frequency::Daily
            },
            weekday,
            slots,
        })
    }

    pub fn timex(&self) -> &str {
        &self.timex
    }

    pub fn timezone(&self) -> FixedOffset {
        self.tz
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.weekday
    }

    /// Times of day at which the set fires, in ascending order.
    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    fn matches(&self, day: NaiveDate) -> bool {
        self.weekday.is_none_or(|weekday| day.weekday() == weekday)
    }

    /// Lazily enumerates occurrences at or after `from` (local wall-clock
    /// time in this set's offset).
    pub fn occurrences(&self, from: NaiveDateTime, limit: Limit) -> Occurrences<'_> {
        let (remaining, until) = match limit {
            Limit::Count(n) => (Some(n), None),
            Limit::Until(until) => (None, Some(until)),
            Limit::Unbounded => (None, None),
        };
        Occurrences {
            set: self,
            from,
            day: Some(from.date()),
            slot: 0,
            remaining,
            until,
        }
    }
}

impl fmt::Display for TimeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.timex)
    }
}

fn parse_range(timex: &str, inner: &str) -> EntityResult<(Option<Weekday>, Vec<NaiveTime>)> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let &[start, end, duration] = parts.as_slice() else {
        return Err(EntityError::time_set(timex, "range needs start, end and duration"));
    };

    let start = parse_point(timex, start)?;
    let end = parse_point(timex, end)?;
    if start.weekday != end.weekday {
        return Err(EntityError::time_set(timex, "range endpoints differ in day"));
    }
    let (Some(first), Some(last)) = (start.time, end.time) else {
        return Err(EntityError::time_set(timex, "range endpoints need a time of day"));
    };
    if first >= last {
        return Err(EntityError::time_set(timex, "range end is not after start"));
    }

    let duration = to_timedelta(duration)
        .map_err(|_| EntityError::time_set(timex, format!("invalid duration '{duration}'")))?;
    if duration != last - first {
        return Err(EntityError::time_set(timex, "duration does not match the endpoints"));
    }

    let mut slots = Vec::new();
    let mut time = first;
    while time < last {
        slots.push(time);
        let (next, wrapped) = time.overflowing_add_signed(TimeDelta::hours(1));
        if wrapped != 0 {
            break;
        }
        time = next;
    }
    Ok((start.weekday, slots))
}

fn parse_point(timex: &str, input: &str) -> EntityResult<Point> {
    let (date, time) = match input.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (input, None),
    };

    let weekday = match date {
        "" | "XXXX-XX-XX" => None,
        other => {
            let day = other
                .strip_prefix("XXXX-WXX-")
                .ok_or_else(|| EntityError::time_set(timex, format!("unsupported date '{other}'")))?;
            Some(weekday_from_iso(day).ok_or_else(|| {
                EntityError::time_set(timex, format!("invalid weekday '{day}'"))
            })?)
        }
    };

    let time = time.map(|t| parse_clock(timex, t)).transpose()?;
    if weekday.is_none() && time.is_none() && !date.is_empty() {
        return Err(EntityError::time_set(timex, "missing time of day"));
    }
    Ok(Point { weekday, time })
}

fn weekday_from_iso(day: &str) -> Option<Weekday> {
    match day {
        "1" => Some(Weekday::Mon),
        "2" => Some(Weekday::Tue),
        "3" => Some(Weekday::Wed),
        "4" => Some(Weekday::Thu),
        "5" => Some(Weekday::Fri),
        "6" => Some(Weekday::Sat),
        "7" => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_clock(timex: &str, input: &str) -> EntityResult<NaiveTime> {
    let invalid = || EntityError::time_set(timex, format!("invalid time '{input}'"));

    let mut fields = [0u32; 3];
    let parts: Vec<&str> = input.split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(invalid());
    }
    for (field, part) in fields.iter_mut().zip(&parts) {
        if part.len() != 2 {
            return Err(invalid());
        }
        *field = part.parse().map_err(|_| invalid())?;
    }
    NaiveTime::from_hms_opt(fields[0], fields[1], fields[2]).ok_or_else(invalid)
}

/// Iterator returned by [`TimeSet::occurrences`].
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    set: &'a TimeSet,
    from: NaiveDateTime,
    day: Option<NaiveDate>,
    slot: usize,
    remaining: Option<usize>,
    until: Option<DateTime<FixedOffset>>,
}

impl Occurrences<'_> {
    fn finish(&mut self) -> Option<DateTime<FixedOffset>> {
        self.day = None;
        None
    }
}

impl Iterator for Occurrences<'_> {
    type Item = DateTime<FixedOffset>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let day = self.day?;
            if self.set.matches(day) {
                while let Some(slot) = self.set.slots.get(self.slot) {
                    self.slot += 1;
                    let local = day.and_time(*slot);
                    if local < self.from {
                        continue;
                    }
                    let Some(at) = self.set.tz.from_local_datetime(&local).single() else {
                        return self.finish();
                    };
                    if self.until.is_some_and(|until| at > until) {
                        return self.finish();
                    }
                    if let Some(n) = self.remaining.as_mut() {
                        *n -= 1;
                    }
                    return Some(at);
                }
            }
            self.slot = 0;
            self.day = day.succ_opt();
        }
    }
}

impl std::iter::FusedIterator for Occurrences<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn at(tz: FixedOffset, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        tz.from_local_datetime(&local(y, m, d, h, min)).unwrap()
    }

    #[test]
    fn test_daily() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let set = TimeSet::parse("T08:30", tz).unwrap();
        assert_eq!(set.frequency(), Frequency::Daily);

        // 2020-01-01 09:00 is past today's slot.
        let got: Vec<_> = set
            .occurrences(local(2020, 1, 1, 9, 0), Limit::Count(2))
            .collect();
        assert_eq!(
            got,
            vec![at(tz, 2020, 1, 2, 8, 30), at(tz, 2020, 1, 3, 8, 30)]
        );
        assert_eq!(got[0].offset(), &tz);
    }

    #[test]
    fn test_daily_with_unknown_date() {
        let set = TimeSet::parse("XXXX-XX-XXT08:30", utc()).unwrap();
        assert_eq!(set.slots(), &[NaiveTime::from_hms_opt(8, 30, 0).unwrap()]);
        assert_eq!(set.weekday(), None);
    }

    #[test]
    fn test_weekly() {
        let set = TimeSet::parse("XXXX-WXX-1T14:00", utc()).unwrap();
        assert_eq!(set.frequency(), Frequency::Weekly);
        assert_eq!(set.weekday(), Some(Weekday::Mon));

        // 2020-01-01 is a Wednesday.
        let got: Vec<_> = set
            .occurrences(local(2020, 1, 1, 0, 0), Limit::Count(2))
            .collect();
        assert_eq!(
            got,
            vec![at(utc(), 2020, 1, 6, 14, 0), at(utc(), 2020, 1, 13, 14, 0)]
        );
    }

    #[test]
    fn test_weekly_defaults_to_midnight() {
        let set = TimeSet::parse("XXXX-WXX-7", utc()).unwrap();
        let first = set
            .occurrences(local(2020, 1, 1, 0, 0), Limit::Unbounded)
            .next()
            .unwrap();
        assert_eq!(first, at(utc(), 2020, 1, 5, 0, 0));
    }

    #[test]
    fn test_hour_range() {
        let set = TimeSet::parse("(XXXX-WXX-1T14,XXXX-WXX-1T18,PT4H)", utc()).unwrap();
        assert_eq!(set.slots().len(), 4);

        let got: Vec<_> = set
            .occurrences(local(2020, 1, 1, 0, 0), Limit::Count(5))
            .collect();
        assert_eq!(
            got,
            vec![
                at(utc(), 2020, 1, 6, 14, 0),
                at(utc(), 2020, 1, 6, 15, 0),
                at(utc(), 2020, 1, 6, 16, 0),
                at(utc(), 2020, 1, 6, 17, 0),
                at(utc(), 2020, 1, 13, 14, 0),
            ]
        );
    }

    #[test]
    fn test_until_is_inclusive() {
        let set = TimeSet::parse("T08:00", utc()).unwrap();
        let until = at(utc(), 2020, 1, 3, 8, 0);
        let count = set
            .occurrences(local(2020, 1, 1, 0, 0), Limit::Until(until))
            .count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_unbounded_stops_at_calendar_end() {
        let set = TimeSet::parse("T00:00", utc()).unwrap();
        let start = NaiveDate::MAX.pred_opt().unwrap().and_time(NaiveTime::default());
        assert_eq!(set.occurrences(start, Limit::Unbounded).count(), 2);
    }

    #[test]
    fn test_restartable() {
        let set = TimeSet::parse("T12:00", utc()).unwrap();
        let from = local(2020, 1, 1, 0, 0);
        let a: Vec<_> = set.occurrences(from, Limit::Count(3)).collect();
        let b: Vec<_> = set.occurrences(from, Limit::Count(3)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed() {
        for timex in [
            "garbage",
            "XXXX-XX-XX",
            "XXXX-WXX-8T10:00",
            "2020-01-01T10:00",
            "T25:00",
            "T8:00",
            "(T14,T18,PT3H)",
            "(T18,T14,PT4H)",
            "(XXXX-WXX-1T14,XXXX-WXX-2T18,PT4H)",
            "(T14,T18)",
        ] {
            assert!(
                matches!(TimeSet::parse(timex, utc()), Err(EntityError::InvalidTimeSet { .. })),
                "{timex}"
            );
        }
    }
}
