//! # codescan
//!
//! Core of a barcode/QR scanner:
//! - Platform-aware normalization and structural validation of detected codes
//! - A capped, searchable scan history
//! - Persisted enabled code types with fail-open lookups
//! - A scan session that gates, dedups and debounces live detections
//!
//! Persistence goes through [`storage::KeyValueStore`]; [`storage::FileStore`]
//! keeps one JSON document per key on disk.

pub mod barcode;
pub mod config;
pub mod error;
pub mod history;
pub mod replay;
pub mod session;
pub mod settings;
pub mod storage;
pub mod utils;

pub use barcode::{validate, CodeType, Detection, Normalizer, Platform, Validation};
pub use config::Config;
pub use error::{Error, Result};
pub use history::{HistoryStore, NewScan, ScanRecord, MAX_HISTORY_ITEMS};
pub use replay::{FeedEvent, FeedReader, Replay, ReplaySummary};
pub use session::{ScanOutcome, ScanSession, DEFAULT_SETTLE_DELAY};
pub use settings::SettingsStore;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
