use crate::dates::{DateNormalizer, DisplayFormat, RangeShortcut, RawDate};
use crate::records::RecordFilter;
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use std::path::PathBuf;

const CONFIG_FILE: &str = "playdash.toml";
const ENV_PREFIX: &str = "PLAYDASH_";

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// How dates and tables are rendered. Built once at startup and handed to
/// whatever renders.
#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub date_format: DisplayFormat,

    /// Offset used to decide calendar days and to anchor wall-clock inputs.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: DisplayFormat::default(),
            utc_offset_minutes: 0,
            page_size: default_page_size(),
        }
    }
}

impl DisplayConfig {
    /// `None` when the offset is a day or more.
    pub fn normalizer(&self) -> Option<DateNormalizer> {
        DateNormalizer::from_utc_offset_minutes(self.utc_offset_minutes)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SourceConfig {
    pub playground: Option<String>,

    /// JSON array of records.
    pub records_path: Option<PathBuf>,

    /// JSON array of playgrounds for the sidebar.
    pub playgrounds_path: Option<PathBuf>,

    pub api_url: Option<String>,
    pub api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub start: RawDate,
    #[serde(default)]
    pub end: RawDate,
    #[serde(default)]
    pub day: RawDate,
    pub batch_no: Option<String>,
    pub status: Option<String>,
    pub shortcut: Option<RangeShortcut>,
}

fn default_page_size() -> usize {
    100
}

/// Load configuration from playdash.toml and environment variables
pub fn load() -> Result<Config> {
    load_from(
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            // Double underscore separates sections: PLAYDASH_SOURCE__API_URL
            .merge(Env::prefixed(ENV_PREFIX).split("__")),
    )
}

pub fn load_from(figment: Figment) -> Result<Config> {
    figment.extract().context("Failed to load configuration")
}

/// Validate configuration and return a user-friendly error
pub fn validate(config: &Config) -> Result<(), String> {
    let display = &config.display;
    let source = &config.source;
    let filter = &config.filter;

    let Some(normalizer) = display.normalizer() else {
        return Err("display.utc_offset_minutes must be between -1439 and 1439".into());
    };

    if display.page_size == 0 {
        return Err("display.page_size must be greater than 0".into());
    }

    match (&source.records_path, &source.api_url) {
        (None, None) => return Err("source.records_path or source.api_url is required".into()),
        (Some(_), Some(_)) => {
            return Err("source.records_path and source.api_url are mutually exclusive".into());
        }
        (None, Some(_)) if source.playground.is_none() => {
            return Err("source.playground is required when using source.api_url".into());
        }
        _ => {}
    }

    for (key, value) in [
        ("filter.start", &filter.start),
        ("filter.end", &filter.end),
        ("filter.day", &filter.day),
    ] {
        if !value.is_missing() && normalizer.parse(value).is_none() {
            return Err(format!("{key} is not a recognizable date"));
        }
    }

    if let Some(status) = &filter.status
        && RecordFilter::default().with_status(status).is_err()
    {
        return Err(format!(
            "filter.status must be All, finished, active or failed (got {status})"
        ));
    }

    Ok(())
}

/// A sanitized view of SourceConfig safe for logging
#[derive(Debug)]
#[allow(dead_code)]
pub struct SanitizedSourceConfig {
    pub playground: String,
    pub records_path: Option<PathBuf>,
    pub playgrounds_path: Option<PathBuf>,
    pub api_url: String,
    pub api_token: String,
}

impl SourceConfig {
    pub fn sanitized_for_log(&self) -> SanitizedSourceConfig {
        SanitizedSourceConfig {
            playground: self.playground.clone().unwrap_or_else(|| "<not set>".into()),
            records_path: self.records_path.clone(),
            playgrounds_path: self.playgrounds_path.clone(),
            api_url: self.api_url.clone().unwrap_or_else(|| "<not set>".into()),
            api_token: if self.api_token.is_some() {
                "******".into()
            } else {
                "<not set>".into()
            },
        }
    }
}
