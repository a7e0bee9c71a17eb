use super::pattern::{self, Direction};
use super::{CanonicalDate, DateNormalizer, RawDate};
use serde::{Deserialize, Deserializer};
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// Shown in place of any date that cannot be read.
pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayFormat {
    Short,
    #[default]
    Medium,
    Long,
    Time,
    Iso,
    DateTime,
}

impl DisplayFormat {
    pub const ALL: [DisplayFormat; 6] = [
        DisplayFormat::Short,
        DisplayFormat::Medium,
        DisplayFormat::Long,
        DisplayFormat::Time,
        DisplayFormat::Iso,
        DisplayFormat::DateTime,
    ];

    /// The pattern in the same token syntax accepted by
    /// [`DateNormalizer::format_with`].
    pub fn pattern(&self) -> &'static str {
        match self {
            DisplayFormat::Short => "MMM DD",
            DisplayFormat::Medium => "MMM DD, YYYY",
            DisplayFormat::Long => "MMMM DD, YYYY",
            DisplayFormat::Time => "MMM DD, YYYY HH:mm",
            DisplayFormat::Iso => "YYYY-MM-DD",
            DisplayFormat::DateTime => "MMM DD, YYYY HH:mm:ss",
        }
    }

    fn strftime(&self) -> &'static str {
        match self {
            DisplayFormat::Short => "%b %d",
            DisplayFormat::Medium => "%b %d, %Y",
            DisplayFormat::Long => "%B %d, %Y",
            DisplayFormat::Time => "%b %d, %Y %H:%M",
            DisplayFormat::Iso => "%Y-%m-%d",
            DisplayFormat::DateTime => "%b %d, %Y %H:%M:%S",
        }
    }
}

impl fmt::Display for DisplayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayFormat::Short => write!(f, "SHORT"),
            DisplayFormat::Medium => write!(f, "MEDIUM"),
            DisplayFormat::Long => write!(f, "LONG"),
            DisplayFormat::Time => write!(f, "TIME"),
            DisplayFormat::Iso => write!(f, "ISO"),
            DisplayFormat::DateTime => write!(f, "DATETIME"),
        }
    }
}

impl FromStr for DisplayFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SHORT" => Ok(DisplayFormat::Short),
            "MEDIUM" => Ok(DisplayFormat::Medium),
            "LONG" => Ok(DisplayFormat::Long),
            "TIME" => Ok(DisplayFormat::Time),
            "ISO" => Ok(DisplayFormat::Iso),
            "DATETIME" => Ok(DisplayFormat::DateTime),
            other => Err(anyhow::anyhow!("Unknown date display format: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for DisplayFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

impl CanonicalDate {
    pub fn format(&self, format: DisplayFormat) -> String {
        render(self, format.strftime())
    }

    pub fn format_pattern(&self, pattern: &str) -> String {
        render(self, &pattern::to_strftime(pattern, Direction::Format))
    }
}

impl DateNormalizer {
    /// Renders `input` in `format`, or [`PLACEHOLDER`] when it cannot be read.
    pub fn format(&self, input: impl Into<RawDate>, format: DisplayFormat) -> String {
        self.parse(input)
            .map_or_else(|| PLACEHOLDER.to_string(), |date| date.format(format))
    }

    /// Renders `input` with an arbitrary token pattern such as `DD/MM HH:mm`.
    pub fn format_with(&self, input: impl Into<RawDate>, pattern: &str) -> String {
        self.parse(input)
            .map_or_else(|| PLACEHOLDER.to_string(), |date| date.format_pattern(pattern))
    }
}

fn render(date: &CanonicalDate, layout: &str) -> String {
    let mut out = String::new();
    match write!(out, "{}", date.as_datetime().format(layout)) {
        Ok(()) => out,
        Err(_) => PLACEHOLDER.to_string(),
    }
}
