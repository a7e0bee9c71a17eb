use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveTime, TimeZone, Timelike};
use std::cmp::Ordering;
use std::fmt;

/// Granularity used by the comparison helpers on [`CanonicalDate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Millisecond,
    Day,
    /// Weeks start on Sunday.
    Week,
    Month,
    Year,
}

/// Which ends of an interval [`CanonicalDate::is_between`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Inclusivity {
    #[default]
    Exclusive,
    Inclusive,
    StartInclusive,
    EndInclusive,
}

/// A normalized point in time, carrying the offset its calendar fields are
/// read in. Values are immutable: every transformation returns a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate(DateTime<FixedOffset>);

impl CanonicalDate {
    pub fn new(inner: DateTime<FixedOffset>) -> Self {
        Self(inner)
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    pub fn offset(&self) -> FixedOffset {
        *self.0.offset()
    }

    /// The same instant, read in another offset.
    pub fn with_offset(&self, offset: FixedOffset) -> Self {
        Self(self.0.with_timezone(&offset))
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn add_days(&self, days: i64) -> Self {
        Duration::try_days(days)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
            .unwrap_or(*self)
    }

    pub fn start_of(&self, unit: Unit) -> Self {
        floor(&self.0, unit).map(Self).unwrap_or(*self)
    }

    /// Last millisecond of the enclosing `unit`.
    pub fn end_of(&self, unit: Unit) -> Self {
        floor(&self.0, unit)
            .and_then(|start| next_boundary(&start, unit))
            .and_then(|next| next.checked_sub_signed(Duration::milliseconds(1)))
            .map(Self)
            .unwrap_or(*self)
    }

    pub fn is_before(&self, other: &CanonicalDate, unit: Unit) -> bool {
        self.compare_at(other, unit) == Ordering::Less
    }

    pub fn is_after(&self, other: &CanonicalDate, unit: Unit) -> bool {
        self.compare_at(other, unit) == Ordering::Greater
    }

    pub fn is_same(&self, other: &CanonicalDate, unit: Unit) -> bool {
        self.compare_at(other, unit) == Ordering::Equal
    }

    pub fn is_same_or_after(&self, other: &CanonicalDate, unit: Unit) -> bool {
        self.compare_at(other, unit) != Ordering::Less
    }

    pub fn is_same_or_before(&self, other: &CanonicalDate, unit: Unit) -> bool {
        self.compare_at(other, unit) != Ordering::Greater
    }

    pub fn is_between(
        &self,
        start: &CanonicalDate,
        end: &CanonicalDate,
        unit: Unit,
        inclusivity: Inclusivity,
    ) -> bool {
        let (start_ok, end_ok) = match inclusivity {
            Inclusivity::Exclusive => (self.is_after(start, unit), self.is_before(end, unit)),
            Inclusivity::Inclusive => (
                self.is_same_or_after(start, unit),
                self.is_same_or_before(end, unit),
            ),
            Inclusivity::StartInclusive => {
                (self.is_same_or_after(start, unit), self.is_before(end, unit))
            }
            Inclusivity::EndInclusive => {
                (self.is_after(start, unit), self.is_same_or_before(end, unit))
            }
        };
        start_ok && end_ok
    }

    /// Compares at `unit` granularity. Calendar units are judged in this
    /// value's offset, so `other` is re-read in it first.
    fn compare_at(&self, other: &CanonicalDate, unit: Unit) -> Ordering {
        let other = other.with_offset(self.offset());
        self.start_of(unit).0.cmp(&other.start_of(unit).0)
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

fn floor(dt: &DateTime<FixedOffset>, unit: Unit) -> Option<DateTime<FixedOffset>> {
    let date = dt.date_naive();
    let day_start = match unit {
        Unit::Millisecond => {
            let millis = dt.nanosecond() / 1_000_000 * 1_000_000;
            return dt.with_nanosecond(millis);
        }
        Unit::Day => date,
        Unit::Week => date.checked_sub_signed(Duration::days(
            i64::from(date.weekday().num_days_from_sunday()),
        ))?,
        Unit::Month => date.with_day(1)?,
        Unit::Year => date.with_ordinal(1)?,
    };
    dt.offset()
        .from_local_datetime(&day_start.and_time(NaiveTime::default()))
        .single()
}

fn next_boundary(start: &DateTime<FixedOffset>, unit: Unit) -> Option<DateTime<FixedOffset>> {
    match unit {
        Unit::Millisecond => start.checked_add_signed(Duration::milliseconds(1)),
        Unit::Day => start.checked_add_signed(Duration::days(1)),
        Unit::Week => start.checked_add_signed(Duration::days(7)),
        Unit::Month => start.checked_add_months(Months::new(1)),
        Unit::Year => start.checked_add_months(Months::new(12)),
    }
}
