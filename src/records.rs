use crate::dates::{CanonicalDate, DateNormalizer, DateRange, RawDate, Unit};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Dropdown value meaning "no constraint".
pub const ALL_OPTION: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Finished,
    Active,
    Failed,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Finished => write!(f, "finished"),
            RecordStatus::Active => write!(f, "active"),
            RecordStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RecordStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "finished" => Ok(RecordStatus::Finished),
            "active" => Ok(RecordStatus::Active),
            "failed" => Ok(RecordStatus::Failed),
            other => Err(anyhow::anyhow!("Unknown record status: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordData {
    pub reference_no: String,
    pub batch_no: String,
    #[serde(default)]
    pub date: RawDate,
    pub customer: Option<String>,
    pub comment: Option<String>,
    pub status: RecordStatus,
    pub result: Option<String>,
    pub json: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundData {
    pub name: String,
    #[serde(default)]
    pub last_modified: RawDate,
    pub test_value: Option<String>,
    pub prod_value: Option<String>,
    pub success_rate: String,
    pub failure_rate: String,
    pub folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderData {
    pub name: String,
    pub playgrounds: Vec<PlaygroundData>,
}

/// Counts behind the dashboard's stat cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub started: u64,
    pub finished: u64,
    pub failed: u64,
    pub still_running: u64,
}

/// The records table's filter bar plus the page-level date range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    /// Single calendar day picked in the filter bar.
    pub day: Option<CanonicalDate>,
    pub batch_no: Option<String>,
    pub status: Option<RecordStatus>,
    pub range: DateRange,
}

impl RecordFilter {
    /// Sets the batch dropdown. `"All"` and blank clear it.
    pub fn with_batch(mut self, batch_no: &str) -> Self {
        self.batch_no = dropdown_value(batch_no).map(str::to_string);
        self
    }

    /// Sets the status dropdown. `"All"` and blank clear it.
    pub fn with_status(mut self, status: &str) -> Result<Self> {
        self.status = dropdown_value(status).map(str::parse).transpose()?;
        Ok(self)
    }

    pub fn with_day(mut self, day: Option<CanonicalDate>) -> Self {
        self.day = day;
        self
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    /// Clears the filter bar. The page's date range is not part of it.
    pub fn reset(&mut self) {
        self.day = None;
        self.batch_no = None;
        self.status = None;
    }

    pub fn matches(&self, record: &RecordData, normalizer: &DateNormalizer) -> bool {
        if self
            .batch_no
            .as_deref()
            .is_some_and(|batch| batch != record.batch_no)
        {
            return false;
        }

        if self.status.is_some_and(|status| status != record.status) {
            return false;
        }

        if self.day.is_none() && self.range.is_unbounded() {
            return true;
        }

        let Some(date) = normalizer.parse(&record.date) else {
            return false;
        };

        self.day.is_none_or(|day| date.is_same(&day, Unit::Day)) && self.range.contains(&date)
    }

    pub fn apply<'a>(
        &self,
        records: &'a [RecordData],
        normalizer: &DateNormalizer,
    ) -> Vec<&'a RecordData> {
        records
            .iter()
            .filter(|record| self.matches(record, normalizer))
            .collect()
    }
}

fn dropdown_value(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty() && value != ALL_OPTION).then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Stable sort on the record date. Records with unreadable dates end up
/// first when ascending and last when descending.
pub fn sort_by_date<R: Borrow<RecordData>>(
    records: &mut [R],
    normalizer: &DateNormalizer,
    order: SortOrder,
) {
    records.sort_by(|a, b| {
        let ordering = normalizer.compare(&a.borrow().date, &b.borrow().date);
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// `"All"` followed by each batch number once, in first-seen order.
pub fn batch_options<R: Borrow<RecordData>>(records: &[R]) -> Vec<String> {
    let mut options = vec![ALL_OPTION.to_string()];
    for record in records {
        let batch = &record.borrow().batch_no;
        if !batch.is_empty() && !options[1..].contains(batch) {
            options.push(batch.clone());
        }
    }
    options
}

pub fn summarize<R: Borrow<RecordData>>(records: &[R]) -> DashboardData {
    records
        .iter()
        .fold(DashboardData::default(), |mut data, record| {
            data.started += 1;
            match record.borrow().status {
                RecordStatus::Finished => data.finished += 1,
                RecordStatus::Failed => data.failed += 1,
                RecordStatus::Active => data.still_running += 1,
            }
            data
        })
}

/// Groups playgrounds by folder in first-seen order. Playgrounds without a
/// folder are returned separately.
pub fn group_into_folders(
    playgrounds: &[PlaygroundData],
) -> (Vec<FolderData>, Vec<PlaygroundData>) {
    let mut folders: Vec<FolderData> = Vec::new();
    let mut loose = Vec::new();

    for playground in playgrounds {
        let Some(folder) = playground.folder.as_deref() else {
            loose.push(playground.clone());
            continue;
        };
        match folders.iter_mut().find(|f| f.name == folder) {
            Some(existing) => existing.playgrounds.push(playground.clone()),
            None => folders.push(FolderData {
                name: folder.to_string(),
                playgrounds: vec![playground.clone()],
            }),
        }
    }

    (folders, loose)
}

pub fn filter_playgrounds<'a>(
    playgrounds: &'a [PlaygroundData],
    range: &DateRange,
    normalizer: &DateNormalizer,
) -> Vec<&'a PlaygroundData> {
    playgrounds
        .iter()
        .filter(|playground| {
            normalizer.in_range(&playground.last_modified, range.start, range.end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<RecordData> {
        serde_json::from_str(
            r#"[
                {"referenceNo": "5769586jg", "batchNo": "123-456", "date": "05.04.2025",
                 "customer": "Robert Johnson", "status": "finished", "result": "$2,455.00"},
                {"referenceNo": "5769587jg", "batchNo": "123-456", "date": 1743897600,
                 "status": "failed"},
                {"referenceNo": "5769589jg", "batchNo": "124-457", "date": "2025-04-05",
                 "status": "finished"},
                {"referenceNo": "5769590jg", "batchNo": "124-457", "date": 1743897600000,
                 "status": "active"},
                {"referenceNo": "5769593jg", "batchNo": "125-458", "date": "2025-04-08T10:30:00Z",
                 "status": "active"},
                {"referenceNo": "5769599jg", "batchNo": "125-458", "date": "someday",
                 "status": "active"}
            ]"#,
        )
        .unwrap()
    }

    fn references(records: &[&RecordData]) -> Vec<String> {
        records.iter().map(|r| r.reference_no.clone()).collect()
    }

    #[test]
    fn deserializes_mixed_date_shapes() {
        let records = records();

        assert_eq!(records[0].date, RawDate::Text("05.04.2025".into()));
        assert_eq!(records[1].date, RawDate::Timestamp(1_743_897_600));
        assert_eq!(records[1].customer, None);
        assert_eq!(records[3].status, RecordStatus::Active);
    }

    #[test]
    fn missing_date_field_is_missing() {
        let record: RecordData = serde_json::from_str(
            r#"{"referenceNo": "r1", "batchNo": "b1", "status": "active"}"#,
        )
        .unwrap();

        assert!(record.date.is_missing());
    }

    #[test]
    fn dropdowns_treat_all_as_unset() {
        let filter = RecordFilter::default()
            .with_batch("All")
            .with_status("All")
            .unwrap();

        assert_eq!(filter, RecordFilter::default());
        assert!(RecordFilter::default().with_status("paused").is_err());
    }

    #[test]
    fn filters_by_batch_and_status() {
        let records = records();
        let normalizer = DateNormalizer::default();
        let filter = RecordFilter::default()
            .with_batch("124-457")
            .with_status("active")
            .unwrap();

        assert_eq!(
            references(&filter.apply(&records, &normalizer)),
            vec!["5769590jg"]
        );
    }

    #[test]
    fn no_date_constraint_keeps_unreadable_dates() {
        let records = records();
        let kept = RecordFilter::default().apply(&records, &DateNormalizer::default());

        assert_eq!(kept.len(), records.len());
    }

    #[test]
    fn day_filter_matches_calendar_day_across_shapes() {
        let records = records();
        let normalizer = DateNormalizer::default();
        let filter = RecordFilter::default().with_day(normalizer.parse("2025-04-05"));

        assert_eq!(
            references(&filter.apply(&records, &normalizer)),
            vec!["5769586jg", "5769589jg"]
        );
    }

    #[test]
    fn range_excludes_unreadable_dates() {
        let records = records();
        let normalizer = DateNormalizer::default();
        let filter = RecordFilter::default().with_range(DateRange::new(
            normalizer.parse("2025-04-06"),
            normalizer.parse("2025-04-08"),
        ));

        assert_eq!(
            references(&filter.apply(&records, &normalizer)),
            vec!["5769587jg", "5769590jg", "5769593jg"]
        );
    }

    #[test]
    fn reset_keeps_range() {
        let normalizer = DateNormalizer::default();
        let range = DateRange::new(normalizer.parse("2025-04-06"), None);
        let mut filter = RecordFilter::default()
            .with_batch("123-456")
            .with_range(range);

        filter.reset();

        assert_eq!(filter.batch_no, None);
        assert_eq!(filter.range, range);
    }

    #[test]
    fn sorts_newest_first_with_unreadable_last() {
        let records = records();
        let mut rows: Vec<&RecordData> = records.iter().collect();

        sort_by_date(&mut rows, &DateNormalizer::default(), SortOrder::Descending);

        assert_eq!(
            references(&rows),
            vec![
                "5769593jg",
                "5769587jg",
                "5769590jg",
                "5769586jg",
                "5769589jg",
                "5769599jg",
            ]
        );
    }

    #[test]
    fn batch_options_are_unique_in_first_seen_order() {
        assert_eq!(
            batch_options(&records()),
            vec!["All", "123-456", "124-457", "125-458"]
        );
    }

    #[test]
    fn summarizes_status_counts() {
        assert_eq!(
            summarize(&records()),
            DashboardData {
                started: 6,
                finished: 2,
                failed: 1,
                still_running: 3,
            }
        );
    }

    fn playgrounds() -> Vec<PlaygroundData> {
        serde_json::from_str(
            r#"[
                {"name": "Onboarding", "lastModified": "2025-01-20T14:22:00Z", "testValue": "381e",
                 "prodValue": "381e", "successRate": "100", "failureRate": "0"},
                {"name": "30Day", "lastModified": 1737456900, "testValue": "6ebd",
                 "prodValue": "6ebd", "successRate": "100", "failureRate": "0", "folder": "Old"},
                {"name": "New Project", "lastModified": 1737885600, "testValue": "abc1",
                 "prodValue": "abc1", "successRate": "95", "failureRate": "5", "folder": "Active"},
                {"name": "Hardship", "lastModified": "2025-01-15T09:30:00Z", "testValue": "4de3",
                 "prodValue": null, "successRate": "0", "failureRate": "0", "folder": "Old"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn groups_playgrounds_by_folder() {
        let (folders, loose) = group_into_folders(&playgrounds());

        let names: Vec<(&str, Vec<&str>)> = folders
            .iter()
            .map(|f| {
                (
                    f.name.as_str(),
                    f.playgrounds.iter().map(|p| p.name.as_str()).collect(),
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![("Old", vec!["30Day", "Hardship"]), ("Active", vec!["New Project"])]
        );
        assert_eq!(loose.len(), 1);
        assert_eq!(loose[0].name, "Onboarding");
    }

    #[test]
    fn filters_playgrounds_by_last_modified() {
        let playgrounds = playgrounds();
        let normalizer = DateNormalizer::default();
        let range = DateRange::new(normalizer.parse("2025-01-20"), normalizer.parse("2025-01-25"));

        let names: Vec<&str> = filter_playgrounds(&playgrounds, &range, &normalizer)
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        // 1737456900 is 2025-01-21T10:55:00Z, 1737885600 is 2025-01-26T10:00:00Z
        assert_eq!(names, vec!["Onboarding", "30Day"]);
    }
}
