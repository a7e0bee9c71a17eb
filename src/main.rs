use anyhow::{Context, Result};
use playdash::api::ApiClient;
use playdash::config::{self, Config, SourceConfig};
use playdash::dates::{DateNormalizer, DateRange, PLACEHOLDER};
use playdash::nav::{NavTree, PlaygroundPage};
use playdash::records::{
    self, PlaygroundData, RecordData, RecordFilter, SortOrder, batch_options, summarize,
};
use playdash::state::UiState;
use playdash::util::format_number;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            std::process::exit(1);
        }
    };

    if let Err(err) = config::validate(&config) {
        eprintln!("Configuration error: {err}");
        std::process::exit(1);
    }

    info!(
        source_config = ?config.source.sanitized_for_log(),
        date_format = %config.display.date_format,
        utc_offset_minutes = config.display.utc_offset_minutes,
        "Effective configuration loaded"
    );

    if let Err(err) = run(&config) {
        error!(error = %format!("{err:#}"), "playdash failed");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    let display = &config.display;
    let normalizer = display
        .normalizer()
        .context("display.utc_offset_minutes is out of range")?;
    let client = config
        .source
        .api_url
        .as_ref()
        .map(|url| ApiClient::new(url.clone(), config.source.api_token.clone()));

    let mut state = UiState::default();
    if let Some(name) = &config.source.playground {
        state.set_current_playground(name.clone(), PlaygroundPage::AllRecords);
    }
    state.set_date_range(date_range(config, &normalizer));

    let records = load_records(&config.source, client.as_ref())?;
    let playgrounds = load_playgrounds(&config.source, client.as_ref())?;
    info!(
        records = records.len(),
        playgrounds = playgrounds.len(),
        "Data loaded"
    );

    let filter = RecordFilter::default()
        .with_batch(config.filter.batch_no.as_deref().unwrap_or_default())
        .with_status(config.filter.status.as_deref().unwrap_or_default())?
        .with_day(normalizer.parse(&config.filter.day))
        .with_range(state.date_range);

    let mut matching = filter.apply(&records, &normalizer);
    records::sort_by_date(&mut matching, &normalizer, SortOrder::Descending);
    debug!(matching = matching.len(), "Records filtered");

    let stats = summarize(&matching);
    println!(
        "Started {}  Finished {}  Failed {}  Running {}",
        format_number(&stats.started.to_string()),
        format_number(&stats.finished.to_string()),
        format_number(&stats.failed.to_string()),
        format_number(&stats.still_running.to_string()),
    );
    println!("Date range: {}", state.date_range.label(&normalizer.now()));
    println!("Batches: {}", batch_options(&records).join(", "));
    println!();

    for record in matching.iter().take(display.page_size) {
        println!(
            "{:<24} {:<14} {:<10} {:<9} {}",
            normalizer.format(&record.date, display.date_format),
            record.reference_no,
            record.batch_no,
            record.status,
            record.customer.as_deref().unwrap_or(PLACEHOLDER),
        );
    }
    if matching.len() > display.page_size {
        println!(
            "... showing {} of {}",
            display.page_size,
            format_number(&matching.len().to_string())
        );
    }

    if !playgrounds.is_empty() {
        let visible: Vec<PlaygroundData> = records::filter_playgrounds(
            &playgrounds,
            &state.date_range,
            &normalizer,
        )
        .into_iter()
        .cloned()
        .collect();

        println!();
        for line in NavTree::build(&visible, &state).lines() {
            println!("{line}");
        }

        let (folders, _) = records::group_into_folders(&visible);
        for folder in folders {
            let names: Vec<&str> = folder.playgrounds.iter().map(|p| p.name.as_str()).collect();
            println!("[{}] {}", folder.name, names.join(", "));
        }
    }

    Ok(())
}

/// A shortcut wins over explicit bounds.
fn date_range(config: &Config, normalizer: &DateNormalizer) -> DateRange {
    match config.filter.shortcut {
        Some(shortcut) => shortcut.range(&normalizer.now()),
        None => DateRange::new(
            normalizer.parse(&config.filter.start),
            normalizer.parse(&config.filter.end),
        ),
    }
}

fn load_records(source: &SourceConfig, client: Option<&ApiClient>) -> Result<Vec<RecordData>> {
    if let Some(path) = &source.records_path {
        return read_json(path);
    }

    let client = client.context("No records source configured")?;
    client.query(
        "getRecords",
        Some(&json!({ "playground": source.playground })),
    )
}

fn load_playgrounds(
    source: &SourceConfig,
    client: Option<&ApiClient>,
) -> Result<Vec<PlaygroundData>> {
    match (&source.playgrounds_path, client) {
        (Some(path), _) => read_json(path),
        (None, Some(client)) => client.query("getPlaygrounds", None),
        (None, None) => Ok(Vec::new()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}
