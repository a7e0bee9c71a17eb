//! Normalization of the loosely-typed date values that arrive in records and
//! playground listings.
//!
//! Upstream data carries dates in several shapes with no tag saying which:
//!   - ISO-8601 timestamps: `2025-04-08T10:30:00Z`
//!   - calendar dates: `2025-04-05`
//!   - dotted record dates: `05.04.2025`
//!   - Unix timestamps in seconds or milliseconds: `1743897600`
//!   - already-typed chrono values
//!
//! [`DateNormalizer::parse`] turns any of them into a [`CanonicalDate`], and
//! never fails loudly: anything it cannot read becomes `None`. Formatting,
//! range filtering and sorting are all built on top of it.

mod canonical;
mod format;
mod pattern;
mod range;
mod sort;

pub use canonical::{CanonicalDate, Inclusivity, Unit};
pub use format::{DisplayFormat, PLACEHOLDER};
pub use range::{DateRange, RangeShortcut};

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use pattern::Direction;
use serde::{Deserialize, Deserializer};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Record dates as exported by the batch tooling.
pub const RECORD_DATE_FORMAT: &str = "DD.MM.YYYY";
pub const ISO_TIMESTAMP_FORMAT: &str = "YYYY-MM-DDTHH:mm:ssZ";
pub const ISO_DATE_FORMAT: &str = "YYYY-MM-DD";
pub const UNIX_SECONDS_FORMAT: &str = "X";
pub const UNIX_MILLIS_FORMAT: &str = "x";

/// Numbers below this are Unix seconds, at or above it Unix milliseconds.
/// Seconds timestamps after the year 2286 are misread as milliseconds.
pub const UNIX_MILLIS_THRESHOLD: i64 = 10_000_000_000;

const FREE_FORM_OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
];

const FREE_FORM_DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %H:%M",
];

const FREE_FORM_DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// A date value of unknown shape.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawDate {
    Canonical(CanonicalDate),
    DateTime(DateTime<FixedOffset>),
    /// Wall-clock value without an offset, anchored in the normalizer's zone.
    Naive(NaiveDateTime),
    Timestamp(i64),
    Fractional(f64),
    Text(String),
    #[default]
    Missing,
}

impl RawDate {
    pub fn is_missing(&self) -> bool {
        matches!(self, RawDate::Missing)
    }
}

/// Shapes a date can take in JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireDate {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for RawDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Option::<WireDate>::deserialize(deserializer)?;
        Ok(match wire {
            Some(WireDate::Integer(value)) => RawDate::Timestamp(value),
            Some(WireDate::Float(value)) => RawDate::Fractional(value),
            Some(WireDate::Text(value)) => RawDate::Text(value),
            None => RawDate::Missing,
        })
    }
}

impl From<CanonicalDate> for RawDate {
    fn from(value: CanonicalDate) -> Self {
        RawDate::Canonical(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for RawDate {
    fn from(value: DateTime<Tz>) -> Self {
        RawDate::DateTime(value.fixed_offset())
    }
}

impl From<NaiveDateTime> for RawDate {
    fn from(value: NaiveDateTime) -> Self {
        RawDate::Naive(value)
    }
}

impl From<NaiveDate> for RawDate {
    fn from(value: NaiveDate) -> Self {
        RawDate::Naive(value.and_time(NaiveTime::default()))
    }
}

impl From<i64> for RawDate {
    fn from(value: i64) -> Self {
        RawDate::Timestamp(value)
    }
}

impl From<f64> for RawDate {
    fn from(value: f64) -> Self {
        RawDate::Fractional(value)
    }
}

impl From<&str> for RawDate {
    fn from(value: &str) -> Self {
        RawDate::Text(value.to_string())
    }
}

impl From<String> for RawDate {
    fn from(value: String) -> Self {
        RawDate::Text(value)
    }
}

impl From<&RawDate> for RawDate {
    fn from(value: &RawDate) -> Self {
        value.clone()
    }
}

impl<T: Into<RawDate>> From<Option<T>> for RawDate {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawDate::Missing, Into::into)
    }
}

/// Reads raw date values into [`CanonicalDate`]s in a fixed offset.
///
/// The offset decides which calendar day a timestamp falls on and where
/// offset-less inputs (`2025-04-05`, `05.04.2025`) are anchored. It holds no
/// other state, so one normalizer can be shared freely.
///
/// The default is UTC, so `1743897600` (2025-04-06T00:00Z) falls on the 6th;
/// a UTC-4 normalizer puts the same instant on the 5th.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNormalizer {
    offset: FixedOffset,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

impl DateNormalizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Returns `None` when the offset is not strictly within ±24 hours.
    pub fn from_utc_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> CanonicalDate {
        self.anchor(Utc::now())
    }

    pub fn parse(&self, input: impl Into<RawDate>) -> Option<CanonicalDate> {
        self.parse_with(input, None)
    }

    /// Like [`parse`](Self::parse), but strings are read strictly against
    /// `explicit_format` (dayjs-style tokens) when one is given.
    pub fn parse_with(
        &self,
        input: impl Into<RawDate>,
        explicit_format: Option<&str>,
    ) -> Option<CanonicalDate> {
        match input.into() {
            RawDate::Canonical(date) => Some(date),
            RawDate::DateTime(value) => Some(self.anchor(value)),
            RawDate::Naive(value) => self.localize(value),
            RawDate::Timestamp(value) => self.read_timestamp(value),
            RawDate::Fractional(value) => self.read_fractional(value),
            RawDate::Text(text) => self.read_text(&text, explicit_format),
            RawDate::Missing => None,
        }
    }

    fn anchor<Tz: TimeZone>(&self, value: DateTime<Tz>) -> CanonicalDate {
        CanonicalDate::new(value.with_timezone(&self.offset))
    }

    fn localize(&self, value: NaiveDateTime) -> Option<CanonicalDate> {
        self.offset
            .from_local_datetime(&value)
            .single()
            .map(CanonicalDate::new)
    }

    fn read_timestamp(&self, value: i64) -> Option<CanonicalDate> {
        let parsed = if value < UNIX_MILLIS_THRESHOLD {
            DateTime::from_timestamp(value, 0)
        } else {
            DateTime::from_timestamp_millis(value)
        };

        if parsed.is_none() {
            warn!(timestamp = value, "Timestamp out of range");
        }
        parsed.map(|dt| self.anchor(dt))
    }

    fn read_fractional(&self, value: f64) -> Option<CanonicalDate> {
        if !value.is_finite() {
            warn!(timestamp = value, "Non-finite timestamp");
            return None;
        }

        let parsed = if value < UNIX_MILLIS_THRESHOLD as f64 {
            let secs = value.floor();
            let nanos = ((value - secs) * 1e9).round().min(999_999_999.0) as u32;
            DateTime::from_timestamp(secs as i64, nanos)
        } else {
            DateTime::from_timestamp_millis(value.round() as i64)
        };

        if parsed.is_none() {
            warn!(timestamp = value, "Timestamp out of range");
        }
        parsed.map(|dt| self.anchor(dt))
    }

    fn read_text(&self, text: &str, explicit_format: Option<&str>) -> Option<CanonicalDate> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some(format) = explicit_format {
            let parsed = self.read_pattern(text, format);
            if parsed.is_none() {
                debug!(input = text, format, "Date does not match explicit format");
            }
            return parsed;
        }

        let shaped = if text.contains('T') && (text.contains('Z') || text.contains('+')) {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| self.anchor(dt))
        } else if text.matches('.').count() == 2 {
            self.read_pattern(text, RECORD_DATE_FORMAT)
        } else if text.matches('-').count() == 2 {
            self.read_pattern(text, ISO_DATE_FORMAT)
        } else {
            None
        };

        let parsed = shaped.or_else(|| self.read_free_form(text));
        if parsed.is_none() {
            debug!(input = text, "Unrecognised date value");
        }
        parsed
    }

    fn read_pattern(&self, text: &str, format: &str) -> Option<CanonicalDate> {
        match format {
            UNIX_SECONDS_FORMAT => text
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|dt| self.anchor(dt)),
            UNIX_MILLIS_FORMAT => text
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt| self.anchor(dt)),
            _ => self.read_layout(text, &pattern::to_strftime(format, Direction::Parse)),
        }
    }

    /// Tries `layout` as an offset-bearing, naive date-time and date-only
    /// layout, in that order.
    fn read_layout(&self, text: &str, layout: &str) -> Option<CanonicalDate> {
        if let Ok(dt) = DateTime::parse_from_str(text, layout) {
            return Some(self.anchor(dt));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
            return self.localize(naive);
        }
        NaiveDate::parse_from_str(text, layout)
            .ok()
            .and_then(|date| self.localize(date.and_time(NaiveTime::default())))
    }

    fn read_free_form(&self, text: &str) -> Option<CanonicalDate> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(self.anchor(dt));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
            return Some(self.anchor(dt));
        }
        if let Some(date) = parse_compact_date(text) {
            return self.localize(date.and_time(NaiveTime::default()));
        }

        FREE_FORM_OFFSET_LAYOUTS
            .iter()
            .find_map(|layout| DateTime::parse_from_str(text, layout).ok())
            .map(|dt| self.anchor(dt))
            .or_else(|| {
                FREE_FORM_DATETIME_LAYOUTS
                    .iter()
                    .find_map(|layout| NaiveDateTime::parse_from_str(text, layout).ok())
                    .and_then(|naive| self.localize(naive))
            })
            .or_else(|| {
                FREE_FORM_DATE_LAYOUTS
                    .iter()
                    .find_map(|layout| NaiveDate::parse_from_str(text, layout).ok())
                    .and_then(|date| self.localize(date.and_time(NaiveTime::default())))
            })
    }

    /// Orders by instant. Unreadable `a` sorts first, unreadable `b` last,
    /// two unreadable values are equal.
    pub fn compare(&self, a: impl Into<RawDate>, b: impl Into<RawDate>) -> Ordering {
        sort::compare_parsed(self.parse(a), self.parse(b))
    }
}

/// Compact `YYYYMMDD` dates. Any other all-digit string is rejected rather
/// than guessed at as a timestamp.
fn parse_compact_date(text: &str) -> Option<NaiveDate> {
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y%m%d").ok()
}

pub fn parse(input: impl Into<RawDate>) -> Option<CanonicalDate> {
    DateNormalizer::default().parse(input)
}

pub fn parse_with(input: impl Into<RawDate>, explicit_format: Option<&str>) -> Option<CanonicalDate> {
    DateNormalizer::default().parse_with(input, explicit_format)
}

pub fn format_date(input: impl Into<RawDate>, format: DisplayFormat) -> String {
    DateNormalizer::default().format(input, format)
}

pub fn format_date_with(input: impl Into<RawDate>, pattern: &str) -> String {
    DateNormalizer::default().format_with(input, pattern)
}

pub fn in_range(
    date: impl Into<RawDate>,
    start: Option<CanonicalDate>,
    end: Option<CanonicalDate>,
) -> bool {
    DateNormalizer::default().in_range(date, start, end)
}

pub fn compare_dates(a: impl Into<RawDate>, b: impl Into<RawDate>) -> Ordering {
    DateNormalizer::default().compare(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_minus_4() -> DateNormalizer {
        DateNormalizer::from_utc_offset_minutes(-240).unwrap()
    }

    fn iso_day(date: Option<CanonicalDate>) -> String {
        date.map(|d| d.as_datetime().date_naive().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn canonical_input_is_identity() {
        let date = parse("2025-04-08T10:30:00Z").unwrap();
        let shifted = date.with_offset(FixedOffset::east_opt(3600).unwrap());

        assert_eq!(parse(date), Some(date));
        // identity keeps the offset it came with
        assert_eq!(parse(shifted).unwrap().offset(), shifted.offset());
    }

    #[test]
    fn reparsing_is_idempotent() {
        for raw in ["05.04.2025", "2025-04-05", "2025-04-08T10:30:00Z"] {
            let once = parse(raw).unwrap();
            assert_eq!(parse(once), Some(once));
        }
    }

    #[test]
    fn chrono_values_keep_their_instant() {
        let value = Utc.with_ymd_and_hms(2025, 4, 5, 14, 30, 45).unwrap();
        let parsed = utc_minus_4().parse(value).unwrap();

        assert_eq!(parsed.as_datetime(), &value);
        assert_eq!(parsed.offset(), utc_minus_4().offset());
    }

    #[test]
    fn naive_date_is_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap();
        let parsed = utc_minus_4().parse(date).unwrap();

        assert_eq!(parsed.to_string(), "2025-04-05T00:00:00-04:00");
    }

    #[test]
    fn timestamp_unit_follows_threshold() {
        let normalizer = utc_minus_4();

        let seconds = normalizer.parse(1_743_897_600_i64);
        let millis = normalizer.parse(1_743_897_600_000_i64);

        assert_eq!(seconds, millis);
        assert_eq!(iso_day(seconds), "2025-04-05");
        // same instant is already the 6th in UTC
        assert_eq!(iso_day(parse(1_743_897_600_i64)), "2025-04-06");
    }

    #[test]
    fn threshold_boundary() {
        let below = parse(UNIX_MILLIS_THRESHOLD - 1).unwrap();
        let at = parse(UNIX_MILLIS_THRESHOLD).unwrap();

        assert_eq!(below.timestamp_millis(), (UNIX_MILLIS_THRESHOLD - 1) * 1000);
        assert_eq!(at.timestamp_millis(), UNIX_MILLIS_THRESHOLD);
    }

    #[test]
    fn fractional_seconds_are_kept() {
        let parsed = parse(1_743_863_445.5_f64).unwrap();

        assert_eq!(parsed.timestamp_millis(), 1_743_863_445_500);
        assert_eq!(parse(f64::NAN), None);
        assert_eq!(parse(f64::INFINITY), None);
    }

    #[test]
    fn out_of_range_timestamp_is_none() {
        assert_eq!(parse(i64::MAX), None);
    }

    #[test]
    fn iso_timestamp_with_zulu_or_offset() {
        let zulu = parse("2025-04-08T10:30:00Z").unwrap();
        let offset = parse("2025-04-08T12:30:00+02:00").unwrap();

        assert_eq!(zulu, offset);
        assert_eq!(zulu.to_string(), "2025-04-08T10:30:00+00:00");

        let same_instant = |text: &str| parse(text).map(|d| d.timestamp_millis());
        let expected = Some(zulu.timestamp_millis());
        assert_eq!(same_instant("2025-04-08T16:00:00+0530"), expected);
        assert_eq!(same_instant("2025-04-08T12:30:00+02"), expected);
        assert_eq!(same_instant("2025-04-08T06:30:00-0400"), expected);
        assert_eq!(
            same_instant("2025-04-08T16:00:00.123+0530"),
            Some(zulu.timestamp_millis() + 123)
        );
        assert_eq!(
            same_instant("2025-04-08T16:00:00+0530"),
            parse_with("2025-04-08T16:00:00+0530", Some(ISO_TIMESTAMP_FORMAT))
                .map(|d| d.timestamp_millis())
        );
    }

    #[test]
    fn dotted_record_date() {
        assert_eq!(
            parse("05.04.2025").unwrap().to_string(),
            "2025-04-05T00:00:00+00:00"
        );
        assert_eq!(parse("32.04.2025"), None);
    }

    #[test]
    fn calendar_date_anchors_in_normalizer_offset() {
        assert_eq!(
            utc_minus_4().parse("2025-04-05").unwrap().to_string(),
            "2025-04-05T00:00:00-04:00"
        );
    }

    #[test]
    fn negative_offset_timestamp_falls_through_to_free_form() {
        let parsed = parse("2025-04-05T10:30:00-05:00").unwrap();
        assert_eq!(parsed.to_string(), "2025-04-05T15:30:00+00:00");
    }

    #[test]
    fn free_form_layouts() {
        assert_eq!(iso_day(parse("2025-04-05 14:30:00")), "2025-04-05");
        assert_eq!(iso_day(parse("2025/04/05")), "2025-04-05");
        assert_eq!(iso_day(parse("Apr 05, 2025")), "2025-04-05");
        assert_eq!(iso_day(parse("April 05, 2025")), "2025-04-05");
        assert_eq!(iso_day(parse("20250405")), "2025-04-05");
        assert_eq!(iso_day(parse("Sat, 05 Apr 2025 14:30:45 +0000")), "2025-04-05");
    }

    #[test]
    fn digit_strings_are_not_timestamps() {
        assert_eq!(parse("1743897600"), None);
    }

    #[test]
    fn missing_and_blank_inputs_are_none() {
        assert_eq!(parse(RawDate::Missing), None);
        assert_eq!(parse(None::<&str>), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("not a date"), None);
    }

    #[test]
    fn explicit_format_is_strict() {
        let parsed = parse_with("2025-04-08T10:30:00Z", Some(ISO_TIMESTAMP_FORMAT)).unwrap();
        assert_eq!(parsed.to_string(), "2025-04-08T10:30:00+00:00");

        assert_eq!(
            iso_day(parse_with("05.04.2025", Some(RECORD_DATE_FORMAT))),
            "2025-04-05"
        );
        assert_eq!(parse_with("2025-04-05", Some(RECORD_DATE_FORMAT)), None);
    }

    #[test]
    fn explicit_unix_seconds_format() {
        assert_eq!(
            parse_with("1743897600", Some(UNIX_SECONDS_FORMAT)),
            parse(1_743_897_600_i64)
        );
        assert_eq!(parse_with("soon", Some(UNIX_SECONDS_FORMAT)), None);
    }

    #[test]
    fn deserializes_every_json_shape() {
        let values: Vec<RawDate> = serde_json::from_str(
            r#"["05.04.2025", 1743897600, 1743897600000, 1743897600.25, null]"#,
        )
        .unwrap();

        assert_eq!(
            values,
            vec![
                RawDate::Text("05.04.2025".into()),
                RawDate::Timestamp(1_743_897_600),
                RawDate::Timestamp(1_743_897_600_000),
                RawDate::Fractional(1_743_897_600.25),
                RawDate::Missing,
            ]
        );
    }
}
