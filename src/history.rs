use crate::barcode::{CodeType, Detection, Validation};
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, HISTORY_KEY};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub const MAX_HISTORY_ITEMS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub code_type: CodeType,
    pub value: String,
    pub timestamp: i64,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScanRecord {
    fn matches(&self, query: &str) -> bool {
        self.value.to_lowercase().contains(query)
            || self.code_type.id().to_lowercase().contains(query)
    }
}

/// A scan waiting to be written; the store assigns `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScan {
    pub code_type: CodeType,
    pub value: String,
    pub is_valid: bool,
    pub error: Option<String>,
}

impl NewScan {
    pub fn new(code_type: CodeType, value: impl Into<String>, validation: Validation) -> Self {
        Self {
            code_type,
            value: value.into(),
            is_valid: validation.is_valid,
            error: validation.error,
        }
    }

    pub fn from_detection(detection: Detection, validation: Validation) -> Self {
        Self::new(
            detection.code_type,
            detection.value.unwrap_or_default(),
            validation,
        )
    }

    fn into_record(self, id: String, timestamp: i64) -> ScanRecord {
        ScanRecord {
            id,
            code_type: self.code_type,
            value: self.value,
            timestamp,
            is_valid: self.is_valid,
            error: self.error,
        }
    }
}

fn generate_id(timestamp: i64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| std::char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect();
    format!("{}-{}", timestamp, suffix)
}

/// Most-recent-first scan log persisted as one JSON list.
pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    max_items: usize,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_max_items(store, MAX_HISTORY_ITEMS)
    }

    pub fn with_max_items(store: Arc<dyn KeyValueStore>, max_items: usize) -> Self {
        Self {
            store,
            max_items,
            write_lock: Mutex::new(()),
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::Storage("history lock poisoned".into()))
    }

    fn persist(&self, history: &[ScanRecord]) -> Result<()> {
        let json = serde_json::to_string(history)?;
        self.store.set(HISTORY_KEY, &json)
    }

    pub fn save(&self, scan: NewScan) -> Result<ScanRecord> {
        let _guard = self.lock()?;
        let mut history = self.read_history()?;

        let timestamp = Utc::now().timestamp_millis();
        let mut id = generate_id(timestamp);
        while history.iter().any(|r| r.id == id) {
            id = generate_id(timestamp);
        }

        let record = scan.into_record(id, timestamp);
        history.insert(0, record.clone());
        history.truncate(self.max_items);

        self.persist(&history)?;
        info!(
            id = %record.id,
            code_type = %record.code_type,
            valid = record.is_valid,
            "saved scan"
        );
        Ok(record)
    }

    /// Storage errors are returned; a corrupt payload reads as empty.
    fn read_history(&self) -> Result<Vec<ScanRecord>> {
        let Some(data) = self.store.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&data) {
            Ok(history) => Ok(history),
            Err(e) => {
                warn!("Discarding unreadable scan history: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Never fails: a missing, unreadable or corrupt history reads as empty.
    pub fn get_history(&self) -> Vec<ScanRecord> {
        self.read_history().unwrap_or_else(|e| {
            warn!("Failed to read scan history: {}", e);
            Vec::new()
        })
    }

    pub fn delete_barcode(&self, id: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut history = self.read_history()?;

        let Some(pos) = history.iter().position(|r| r.id == id) else {
            return Ok(());
        };
        history.remove(pos);

        self.persist(&history)?;
        info!(id, "deleted scan");
        Ok(())
    }

    pub fn clear_history(&self) -> Result<()> {
        let _guard = self.lock()?;
        self.store.remove(HISTORY_KEY)?;
        info!("cleared scan history");
        Ok(())
    }

    pub fn get_history_count(&self) -> usize {
        self.get_history().len()
    }

    /// Case-insensitive match on value or type identifier. A blank query
    /// returns the whole history.
    pub fn search(&self, query: &str) -> Vec<ScanRecord> {
        let history = self.get_history();
        if query.trim().is_empty() {
            return history;
        }
        let query = query.to_lowercase();
        history.into_iter().filter(|r| r.matches(&query)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::FlakyStore;
    use crate::storage::{FileStore, MemoryStore};
    use std::sync::atomic::Ordering;

    fn memory_history() -> (Arc<MemoryStore>, HistoryStore) {
        let store = Arc::new(MemoryStore::new());
        let history = HistoryStore::new(store.clone());
        (store, history)
    }

    fn scan(value: &str) -> NewScan {
        NewScan::new(CodeType::Qr, value, Validation::valid())
    }

    #[test]
    fn test_save_prepends_with_generated_fields() {
        let (_, history) = memory_history();
        let first = history.save(scan("first")).unwrap();
        let second = history.save(scan("second")).unwrap();

        let records = history.get_history();
        assert_eq!(records, vec![second.clone(), first.clone()]);
        assert_ne!(first.id, second.id);
        assert!(first.timestamp > 0);

        let (millis, suffix) = first.id.split_once('-').unwrap();
        assert_eq!(millis.parse::<i64>().unwrap(), first.timestamp);
        assert_eq!(suffix.len(), 9);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let (_, history) = memory_history();
        for i in 0..=MAX_HISTORY_ITEMS {
            history.save(scan(&i.to_string())).unwrap();
        }

        let records = history.get_history();
        assert_eq!(records.len(), MAX_HISTORY_ITEMS);
        assert_eq!(records[0].value, MAX_HISTORY_ITEMS.to_string());
        assert_eq!(records[MAX_HISTORY_ITEMS - 1].value, "1");
        assert!(records.iter().all(|r| r.value != "0"));
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let (_, history) = memory_history();
        history.save(scan("a")).unwrap();
        let before = history.get_history();

        history.delete_barcode("missing").unwrap();
        assert_eq!(history.get_history(), before);
    }

    #[test]
    fn test_delete_removes_matching_record() {
        let (_, history) = memory_history();
        let a = history.save(scan("a")).unwrap();
        let b = history.save(scan("b")).unwrap();

        history.delete_barcode(&a.id).unwrap();
        assert_eq!(history.get_history(), vec![b]);
    }

    #[test]
    fn test_clear_removes_key() {
        let (store, history) = memory_history();
        history.save(scan("a")).unwrap();
        history.clear_history().unwrap();

        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
        assert_eq!(history.get_history_count(), 0);
    }

    #[test]
    fn test_corrupt_payload_reads_as_empty() {
        let (store, history) = memory_history();
        store.set(HISTORY_KEY, "{not json").unwrap();
        assert!(history.get_history().is_empty());
        assert_eq!(history.get_history_count(), 0);
    }

    #[test]
    fn test_read_failure_reads_as_empty() {
        let history = HistoryStore::new(Arc::new(FlakyStore::failing_reads()));
        assert!(history.get_history().is_empty());
        assert_eq!(history.get_history_count(), 0);
    }

    #[test]
    fn test_write_failure_is_returned() {
        let history = HistoryStore::new(Arc::new(FlakyStore::failing_writes()));
        let err = history.save(scan("a")).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(history.clear_history().is_err());
    }

    #[test]
    fn test_read_outage_does_not_overwrite_history() {
        let store = Arc::new(FlakyStore::default());
        let history = HistoryStore::new(store.clone());
        for i in 0..5 {
            history.save(scan(&i.to_string())).unwrap();
        }

        store.fail_reads.store(true, Ordering::SeqCst);
        let err = history.save(scan("during outage")).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(history.delete_barcode("anything").is_err());
        store.fail_reads.store(false, Ordering::SeqCst);

        let records = history.get_history();
        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|r| r.value != "during outage"));
    }

    #[test]
    fn test_invalid_scan_is_recorded_with_error() {
        let (store, history) = memory_history();
        history
            .save(NewScan::new(
                CodeType::UpcA,
                "123",
                Validation::invalid("Invalid UPC-A format (must be 12 digits)"),
            ))
            .unwrap();

        let raw = store.get(HISTORY_KEY).unwrap().unwrap();
        assert!(raw.contains(r#""type":"upc-a""#));
        assert!(raw.contains(r#""isValid":false"#));
        assert!(raw.contains(r#""error":"Invalid UPC-A format (must be 12 digits)""#));
    }

    #[test]
    fn test_reads_records_without_error_field() {
        let (store, history) = memory_history();
        store
            .set(
                HISTORY_KEY,
                r#"[{"id":"1-abc","type":"qr","value":"hi","timestamp":5,"isValid":true}]"#,
            )
            .unwrap();

        let records = history.get_history();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error, None);
        assert_eq!(records[0].code_type, CodeType::Qr);
    }

    #[test]
    fn test_search_matches_value_and_type_case_insensitively() {
        let (_, history) = memory_history();
        history.save(scan("Hello World")).unwrap();
        history
            .save(NewScan::new(CodeType::Ean13, "4006381333931", Validation::valid()))
            .unwrap();

        assert_eq!(history.search("hello").len(), 1);
        assert_eq!(history.search("EAN").len(), 1);
        assert_eq!(history.search("  ").len(), 2);
        assert!(history.search("zzz").is_empty());
    }

    #[test]
    fn test_search_keeps_surrounding_spaces_in_query() {
        let (_, history) = memory_history();
        history.save(scan("Hello World")).unwrap();
        history.save(scan("HelloWorld")).unwrap();

        let found = history.search(" world");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "Hello World");
        assert_eq!(history.search("world").len(), 2);
    }

    #[test]
    fn test_history_survives_store_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let saved = {
            let history = HistoryStore::new(Arc::new(FileStore::new(dir.path())));
            history.save(scan("persisted")).unwrap()
        };

        let reopened = HistoryStore::new(Arc::new(FileStore::new(dir.path())));
        assert_eq!(reopened.get_history(), vec![saved]);
    }
}
