//! Canonical scalar converters for slot values.
//!
//! The upstream NLU delivers every slot as a string. These functions turn
//! those strings into native values. The temporal converters are generic
//! over a *source* trait so that already-converted values, and sequences of
//! candidate values, flow through the same entry points:
//!
//! ```rust,ignore
//! use vox_core::entity::{to_date, to_timedelta};
//!
//! let date = to_date("2001-12-31")?;
//! let first = to_date(&["2001-12-31", "1001-12-31"])?; // first candidate wins
//! let delta = to_timedelta("PT1H5M6S")?;
//! assert_eq!(to_timedelta(&delta)?, delta);            // idempotent
//! ```

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use regex::Regex;
use serde_json::Value;

use crate::error::{EntityError, EntityResult, json_type_name};

/// Datetime layouts carrying a UTC offset. The offset is dropped after parsing
/// and the local wall-clock time is kept.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

// ============================================================================
// Datetime conversion
// ============================================================================

/// A value that can be turned into a [`NaiveDateTime`].
///
/// Implemented for strings (parsed as ISO-8601), for chrono's date and time
/// types, and for sequences of sources. A sequence converts its first
/// element; an empty sequence yields [`NaiveDateTime::MIN`].
pub trait DateTimeSource {
    /// Converts this value into a datetime.
    fn to_datetime(&self) -> EntityResult<NaiveDateTime>;
}

impl DateTimeSource for str {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        parse_datetime(self)
    }
}

impl DateTimeSource for String {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        parse_datetime(self)
    }
}

impl DateTimeSource for NaiveDateTime {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        Ok(*self)
    }
}

/// A bare date is anchored to midnight.
impl DateTimeSource for NaiveDate {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        Ok(self.and_time(NaiveTime::default()))
    }
}

/// A bare time of day is anchored to today's local date.
impl DateTimeSource for NaiveTime {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        Ok(Local::now().date_naive().and_time(*self))
    }
}

impl<Tz: TimeZone> DateTimeSource for DateTime<Tz> {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        Ok(self.naive_local())
    }
}

impl<T: DateTimeSource> DateTimeSource for [T] {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        match self.first() {
            Some(first) => first.to_datetime(),
            None => Ok(NaiveDateTime::MIN),
        }
    }
}

impl<T: DateTimeSource, const N: usize> DateTimeSource for [T; N] {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        self.as_slice().to_datetime()
    }
}

impl<T: DateTimeSource> DateTimeSource for Vec<T> {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        self.as_slice().to_datetime()
    }
}

impl<T: DateTimeSource + ?Sized> DateTimeSource for &T {
    fn to_datetime(&self) -> EntityResult<NaiveDateTime> {
        (**self).to_datetime()
    }
}

fn parse_datetime(input: &str) -> EntityResult<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.naive_local());
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Ok(dt.naive_local());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return date.to_datetime();
        }
    }
    let time = input.strip_prefix('T').unwrap_or(input);
    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(time, format) {
            return time.to_datetime();
        }
    }
    Err(EntityError::InvalidDateTime(input.to_string()))
}

/// Converts a value into a [`NaiveDateTime`].
pub fn to_datetime<S: DateTimeSource + ?Sized>(value: &S) -> EntityResult<NaiveDateTime> {
    value.to_datetime()
}

/// Converts a value into a [`NaiveDate`], projecting the date component.
pub fn to_date<S: DateTimeSource + ?Sized>(value: &S) -> EntityResult<NaiveDate> {
    Ok(value.to_datetime()?.date())
}

/// Converts a value into a [`NaiveTime`], projecting the time component.
pub fn to_time<S: DateTimeSource + ?Sized>(value: &S) -> EntityResult<NaiveTime> {
    Ok(value.to_datetime()?.time())
}

// ============================================================================
// Duration conversion
// ============================================================================

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    let num = r"\d+(?:[.,]\d+)?";
    Regex::new(&format!(
        r"^(?P<sign>[+-])?P(?:(?P<years>{num})Y)?(?:(?P<months>{num})M)?(?:(?P<weeks>{num})W)?(?:(?P<days>{num})D)?(?:T(?:(?P<hours>{num})H)?(?:(?P<minutes>{num})M)?(?:(?P<seconds>{num})S)?)?$"
    ))
    .expect("duration pattern is valid")
});

/// A value that can be turned into a [`TimeDelta`].
pub trait DurationSource {
    /// Converts this value into a duration.
    fn to_timedelta(&self) -> EntityResult<TimeDelta>;
}

impl DurationSource for str {
    fn to_timedelta(&self) -> EntityResult<TimeDelta> {
        parse_duration(self)
    }
}

impl DurationSource for String {
    fn to_timedelta(&self) -> EntityResult<TimeDelta> {
        parse_duration(self)
    }
}

impl DurationSource for TimeDelta {
    fn to_timedelta(&self) -> EntityResult<TimeDelta> {
        Ok(*self)
    }
}

impl DurationSource for std::time::Duration {
    fn to_timedelta(&self) -> EntityResult<TimeDelta> {
        TimeDelta::from_std(*self).map_err(|_| EntityError::Overflow)
    }
}

impl<T: DurationSource + ?Sized> DurationSource for &T {
    fn to_timedelta(&self) -> EntityResult<TimeDelta> {
        (**self).to_timedelta()
    }
}

fn parse_duration(input: &str) -> EntityResult<TimeDelta> {
    let invalid = |reason| EntityError::InvalidDuration {
        input: input.to_string(),
        reason,
    };

    let caps = DURATION_RE
        .captures(input)
        .ok_or_else(|| invalid("not an ISO-8601 duration"))?;

    if caps.name("years").is_some() || caps.name("months").is_some() {
        return Err(invalid("years and months have no fixed length"));
    }
    if input.ends_with('T') {
        return Err(invalid("time designator without components"));
    }

    let component = |name: &str| -> Option<f64> {
        caps.name(name)
            .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
    };

    let parts = [
        (component("weeks"), 7.0 * 86_400.0),
        (component("days"), 86_400.0),
        (component("hours"), 3_600.0),
        (component("minutes"), 60.0),
        (component("seconds"), 1.0),
    ];
    if parts.iter().all(|(value, _)| value.is_none()) {
        return Err(invalid("no duration components"));
    }

    let total: f64 = parts
        .iter()
        .filter_map(|(value, scale)| value.map(|v| v * scale))
        .sum();
    if !total.is_finite() || total >= i64::MAX as f64 {
        return Err(EntityError::Overflow);
    }

    let secs = total.trunc();
    let nanos = ((total - secs) * 1e9).round().min(999_999_999.0);
    let delta = TimeDelta::new(secs as i64, nanos as u32).ok_or(EntityError::Overflow)?;

    match caps.name("sign").map(|m| m.as_str()) {
        Some("-") => Ok(-delta),
        _ => Ok(delta),
    }
}

/// Converts an ISO-8601 duration (e.g. `"PT1H5M6S"`) into a [`TimeDelta`].
///
/// Already-converted durations are returned unchanged.
pub fn to_timedelta<S: DurationSource + ?Sized>(value: &S) -> EntityResult<TimeDelta> {
    value.to_timedelta()
}

// ============================================================================
// Boolean and ordinal conversion
// ============================================================================

/// Converts an on/off spelling into a boolean.
///
/// Recognises `on`, `true`, `yes`, `1` and `off`, `false`, `no`, `0`,
/// case-insensitively. Anything else, including padded variants, fails.
pub fn on_off_to_boolean(value: &str) -> EntityResult<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(EntityError::InvalidBoolean(value.to_string())),
    }
}

/// Converts an ordinal into a zero-based sequence index.
///
/// `"min"` is the first element (`0`), `"max"` the last (`-1`) and `"prec"`
/// the one before it (`-2`). Numbers are one-based and are decremented.
/// `"succ"` has no index representation and is rejected.
pub fn rank(value: &str) -> EntityResult<i64> {
    match value {
        "min" => Ok(0),
        "max" => Ok(-1),
        "prec" => Ok(-2),
        other => other
            .parse::<i64>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or_else(|| EntityError::InvalidRank(other.to_string())),
    }
}

/// Borrows the string inside a JSON value, failing for any other JSON type.
pub fn require_str(value: &Value) -> EntityResult<&str> {
    value.as_str().ok_or(EntityError::ExpectedString {
        found: json_type_name(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_to_date_parses_iso_dates() {
        assert_eq!(to_date("2001-12-31").unwrap(), date(2001, 12, 31));
        assert_eq!(to_date("1001-12-31").unwrap(), date(1001, 12, 31));
    }

    #[test]
    fn test_sequence_uses_first_candidate() {
        let candidates = ["2001-12-31", "1001-12-31"];
        assert_eq!(to_date(&candidates).unwrap(), date(2001, 12, 31));

        let owned = vec!["1001-12-31".to_string()];
        assert_eq!(to_date(&owned).unwrap(), date(1001, 12, 31));
    }

    #[test]
    fn test_empty_sequence_is_minimum() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(to_datetime(&empty).unwrap(), NaiveDateTime::MIN);
    }

    #[test]
    fn test_to_datetime_formats() {
        let expected = date(2020, 5, 17).and_hms_opt(14, 30, 0).unwrap();
        assert_eq!(to_datetime("2020-05-17T14:30:00").unwrap(), expected);
        assert_eq!(to_datetime("2020-05-17T14:30").unwrap(), expected);
        assert_eq!(to_datetime("2020-05-17 14:30:00").unwrap(), expected);
        assert_eq!(to_datetime("2020-05-17T14:30:00+02:00").unwrap(), expected);
        assert_eq!(to_datetime("2020-05-17T14:30:00Z").unwrap(), expected);
        assert_eq!(
            to_datetime("2020-05-17").unwrap(),
            date(2020, 5, 17).and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_bare_time_is_anchored_to_today() {
        let dt = to_datetime("T10:15").unwrap();
        assert_eq!(dt.date(), Local::now().date_naive());
        assert_eq!(dt.time(), NaiveTime::from_hms_opt(10, 15, 0).unwrap());
        assert_eq!(
            to_time("10:15:30").unwrap(),
            NaiveTime::from_hms_opt(10, 15, 30).unwrap()
        );
    }

    #[test]
    fn test_native_values_pass_through() {
        let d = date(1999, 1, 2);
        assert_eq!(to_date(&d).unwrap(), d);
        assert_eq!(to_time(&d).unwrap(), NaiveTime::default());
    }

    #[test]
    fn test_invalid_datetime() {
        assert_eq!(
            to_date("not a date"),
            Err(EntityError::InvalidDateTime("not a date".to_string()))
        );
        assert!(to_date("").is_err());
    }

    #[test]
    fn test_to_timedelta() {
        assert_eq!(to_timedelta("PT1H5M6S").unwrap(), TimeDelta::seconds(3906));
        assert_eq!(to_timedelta("P1DT2H").unwrap(), TimeDelta::hours(26));
        assert_eq!(to_timedelta("P2W").unwrap(), TimeDelta::days(14));
        assert_eq!(to_timedelta("PT0.5S").unwrap(), TimeDelta::milliseconds(500));
        assert_eq!(to_timedelta("-PT10M").unwrap(), TimeDelta::minutes(-10));
    }

    #[test]
    fn test_to_timedelta_is_idempotent() {
        let delta = to_timedelta("PT90M").unwrap();
        assert_eq!(to_timedelta(&delta).unwrap(), delta);
    }

    #[test]
    fn test_to_timedelta_rejects_malformed() {
        assert!(to_timedelta("1H").is_err());
        assert!(to_timedelta("P").is_err());
        assert!(to_timedelta("PT").is_err());
        assert!(to_timedelta("P1DT").is_err());
        assert!(matches!(
            to_timedelta("P1Y"),
            Err(EntityError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_on_off_to_boolean() {
        for value in ["on", "ON", "On", "true", "TRUE", "True", "1", "yes"] {
            assert_eq!(on_off_to_boolean(value), Ok(true), "{value}");
        }
        for value in ["off", "OFF", "Off", "false", "FALSE", "False", "0", "no"] {
            assert_eq!(on_off_to_boolean(value), Ok(false), "{value}");
        }
        for value in ["", " on", "off ", "2", "maybe"] {
            assert!(on_off_to_boolean(value).is_err(), "{value:?}");
        }
    }

    #[test]
    fn test_rank() {
        assert_eq!(rank("min"), Ok(0));
        assert_eq!(rank("max"), Ok(-1));
        assert_eq!(rank("prec"), Ok(-2));
        assert_eq!(rank("1"), Ok(0));
        assert_eq!(rank("5"), Ok(4));
        assert_eq!(rank("succ"), Err(EntityError::InvalidRank("succ".to_string())));
        assert!(rank("first").is_err());
    }

    #[test]
    fn test_require_str() {
        assert_eq!(require_str(&json!("on")), Ok("on"));
        assert_eq!(
            require_str(&json!(1)),
            Err(EntityError::ExpectedString { found: "number" })
        );
    }
}
