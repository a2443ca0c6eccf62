use chrono::{DateTime, Utc};
use codescan::utils::format_relative_time;
use codescan::{CodeType, Platform, ReplaySummary, ScanOutcome, ScanRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ScanReplayResult {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub results: Vec<ScanOutcome>,
    pub frames: usize,
    pub accepted: usize,
    pub invalid: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryListResult {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub total_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: ScanRecord,
    pub age: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResult {
    pub platform: Platform,
    pub enabled_types: Vec<CodeType>,
    pub disabled_types: Vec<CodeType>,
}

impl ScanReplayResult {
    pub fn new(results: Vec<ScanOutcome>, summary: ReplaySummary) -> Self {
        Self {
            version: "1.0".to_string(),
            timestamp: Utc::now(),
            results,
            frames: summary.frames,
            accepted: summary.accepted,
            invalid: summary.invalid,
        }
    }
}

impl HistoryListResult {
    pub fn new(
        records: Vec<ScanRecord>,
        total_count: usize,
        query: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let entries = records
            .into_iter()
            .map(|record| HistoryEntry {
                age: format_relative_time(record.timestamp, now),
                record,
            })
            .collect();

        Self {
            version: "1.0".to_string(),
            timestamp: now,
            total_count,
            query,
            entries,
        }
    }
}

impl SettingsResult {
    pub fn new(platform: Platform, enabled_types: Vec<CodeType>) -> Self {
        let disabled_types = platform
            .supported_types()
            .into_iter()
            .filter(|t| !enabled_types.contains(t))
            .collect();

        Self {
            platform,
            enabled_types,
            disabled_types,
        }
    }
}
