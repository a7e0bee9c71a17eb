use super::{CanonicalDate, DateNormalizer, DisplayFormat, RawDate, Unit};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// A user-selected interval. Either end may be open. Nothing enforces
/// `start <= end`; an inverted range simply matches no dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<CanonicalDate>,
    pub end: Option<CanonicalDate>,
}

impl DateRange {
    pub fn new(start: Option<CanonicalDate>, end: Option<CanonicalDate>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn is_inverted(&self) -> bool {
        matches!((&self.start, &self.end), (Some(start), Some(end)) if start.is_after(end, Unit::Day))
    }

    /// Whole-day inclusive containment.
    pub fn contains(&self, date: &CanonicalDate) -> bool {
        self.start
            .is_none_or(|start| date.is_same_or_after(&start, Unit::Day))
            && self
                .end
                .is_none_or(|end| date.is_same_or_before(&end, Unit::Day))
    }

    /// Label for the picker's trigger button.
    pub fn label(&self, now: &CanonicalDate) -> String {
        let (start, end) = match (self.start, self.end) {
            (None, None) => return "Select Date Range".to_string(),
            (Some(start), None) => return format!("From {}", start.format(DisplayFormat::Short)),
            (None, Some(end)) => return format!("Until {}", end.format(DisplayFormat::Short)),
            (Some(start), Some(end)) => (start, end),
        };

        let shortcut = RangeShortcut::ALL
            .into_iter()
            .filter(|shortcut| *shortcut != RangeShortcut::Reset)
            .find(|shortcut| {
                let range = shortcut.range(now);
                matches!(
                    (range.start, range.end),
                    (Some(s), Some(e)) if start.is_same(&s, Unit::Day) && end.is_same(&e, Unit::Day)
                )
            });
        if let Some(shortcut) = shortcut {
            return shortcut.to_string();
        }

        let start_label = start.format(DisplayFormat::Short);
        if start.is_same(&end, Unit::Day) {
            start_label
        } else if start.is_same(&end, Unit::Year) {
            format!("{start_label} - {}", end.format(DisplayFormat::Short))
        } else {
            format!("{start_label} - {}", end.format(DisplayFormat::Medium))
        }
    }
}

/// Preset ranges offered next to the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeShortcut {
    ThisWeek,
    LastWeek,
    Last7Days,
    CurrentMonth,
    Reset,
}

impl RangeShortcut {
    pub const ALL: [RangeShortcut; 5] = [
        RangeShortcut::ThisWeek,
        RangeShortcut::LastWeek,
        RangeShortcut::Last7Days,
        RangeShortcut::CurrentMonth,
        RangeShortcut::Reset,
    ];

    pub fn range(&self, now: &CanonicalDate) -> DateRange {
        match self {
            RangeShortcut::ThisWeek => {
                DateRange::new(Some(now.start_of(Unit::Week)), Some(now.end_of(Unit::Week)))
            }
            RangeShortcut::LastWeek => {
                let last = now.add_days(-7);
                DateRange::new(Some(last.start_of(Unit::Week)), Some(last.end_of(Unit::Week)))
            }
            RangeShortcut::Last7Days => DateRange::new(Some(now.add_days(-7)), Some(*now)),
            RangeShortcut::CurrentMonth => DateRange::new(
                Some(now.start_of(Unit::Month)),
                Some(now.end_of(Unit::Month)),
            ),
            RangeShortcut::Reset => DateRange::default(),
        }
    }
}

impl fmt::Display for RangeShortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeShortcut::ThisWeek => write!(f, "This Week"),
            RangeShortcut::LastWeek => write!(f, "Last Week"),
            RangeShortcut::Last7Days => write!(f, "Last 7 Days"),
            RangeShortcut::CurrentMonth => write!(f, "Current Month"),
            RangeShortcut::Reset => write!(f, "Reset"),
        }
    }
}

impl FromStr for RangeShortcut {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "this_week" => Ok(RangeShortcut::ThisWeek),
            "last_week" => Ok(RangeShortcut::LastWeek),
            "last_7_days" => Ok(RangeShortcut::Last7Days),
            "current_month" => Ok(RangeShortcut::CurrentMonth),
            "reset" => Ok(RangeShortcut::Reset),
            other => Err(anyhow::anyhow!("Unknown date range shortcut: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for RangeShortcut {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

impl DateNormalizer {
    /// Day-granular, inclusive range check. With no bounds every date passes,
    /// even an unreadable one; with any bound an unreadable date fails.
    pub fn in_range(
        &self,
        date: impl Into<RawDate>,
        start: Option<CanonicalDate>,
        end: Option<CanonicalDate>,
    ) -> bool {
        let range = DateRange::new(start, end);
        if range.is_unbounded() {
            return true;
        }
        self.parse(date).is_some_and(|date| range.contains(&date))
    }
}
