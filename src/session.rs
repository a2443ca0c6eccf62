//! Scan session: turns live detections into displayed results and history
//! writes.
//!
//! The session is driven from one logical thread. All state that gates
//! detections lives here:
//!
//! - **Result gate**: while a result is open, detections are ignored.
//! - **Dedup slot**: the last accepted value; the same value is not accepted
//!   again until the result is dismissed and the settle delay has passed.
//! - **Enabled types**: re-read on focus, never pushed.
//!
//! History writes go through one writer task, in scan order, and are never
//! awaited on the detection path; failures are only logged.

use crate::barcode::{is_url, validate, CodeType, Detection, Normalizer, Validation};
use crate::history::{HistoryStore, NewScan};
use crate::settings::SettingsStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// The result presented for an accepted detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    #[serde(rename = "type")]
    pub code_type: CodeType,
    pub value: String,
    #[serde(flatten)]
    pub validation: Validation,
    pub is_url: bool,
}

enum WriteJob {
    Save(NewScan),
    Flush(oneshot::Sender<()>),
}

/// Starts the task that applies saves one at a time, in the order sent.
fn spawn_writer(
    history: Arc<HistoryStore>,
    runtime: &Handle,
) -> mpsc::UnboundedSender<WriteJob> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    runtime.spawn(async move {
        while let Some(job) = rx.recv().await {
            match job {
                WriteJob::Save(scan) => {
                    let history = Arc::clone(&history);
                    match tokio::task::spawn_blocking(move || history.save(scan)).await {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => error!("Failed to save scan to history: {}", e),
                        Err(e) => error!("History write task failed: {}", e),
                    }
                }
                WriteJob::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    });
    tx
}

pub struct ScanSession {
    normalizer: Normalizer,
    settings: Arc<SettingsStore>,
    writer: mpsc::UnboundedSender<WriteJob>,
    settle_delay: Duration,
    enabled_types: Vec<CodeType>,
    result_open: bool,
    last_scanned_value: Option<String>,
    settle_deadline: Option<Instant>,
}

impl ScanSession {
    pub fn new(history: Arc<HistoryStore>, settings: Arc<SettingsStore>, runtime: Handle) -> Self {
        let normalizer = Normalizer::new(settings.platform());
        let enabled_types = settings.get_enabled_types();
        Self {
            normalizer,
            settings,
            writer: spawn_writer(history, &runtime),
            settle_delay: DEFAULT_SETTLE_DELAY,
            enabled_types,
            result_open: false,
            last_scanned_value: None,
            settle_deadline: None,
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Types the detector should be configured with.
    pub fn enabled_types(&self) -> &[CodeType] {
        &self.enabled_types
    }

    pub fn is_result_open(&self) -> bool {
        self.result_open
    }

    pub fn is_scanning(&self, now: Instant) -> bool {
        !self.result_open && self.settle_deadline.map_or(true, |d| now >= d)
    }

    /// Called when the scanning screen gains focus or the app returns to
    /// the foreground.
    pub fn refresh_settings(&mut self) {
        self.enabled_types = self.settings.get_enabled_types();
        info!(count = self.enabled_types.len(), "reloaded enabled code types");
    }

    fn settle(&mut self, now: Instant) {
        if let Some(deadline) = self.settle_deadline {
            if now >= deadline {
                self.settle_deadline = None;
                self.last_scanned_value = None;
                debug!("scanner settled, accepting repeated values again");
            }
        }
    }

    fn is_filtered_out(&self, code_type: &CodeType) -> bool {
        code_type.is_recognized()
            && *code_type != CodeType::Unknown
            && !self.enabled_types.contains(code_type)
    }

    /// Handles one frame of detections. Returns the result to display when
    /// the first detection of the frame is accepted.
    pub fn on_codes(&mut self, codes: &[Detection], now: Instant) -> Option<ScanOutcome> {
        self.settle(now);

        if self.result_open {
            return None;
        }

        let code = codes.first()?;
        let value = match code.value() {
            Some(v) if !v.is_empty() => v,
            _ => return None,
        };

        if self.last_scanned_value.as_deref() == Some(value) {
            debug!(value, "ignoring repeated detection");
            return None;
        }

        if self.is_filtered_out(&code.code_type) {
            debug!(code_type = %code.code_type, "ignoring disabled code type");
            return None;
        }

        self.last_scanned_value = Some(value.to_string());
        self.result_open = true;

        let normalized = self.normalizer.normalize(code.clone());
        let validation = validate(&normalized.code_type, normalized.value());
        let value = normalized.value.clone().unwrap_or_default();

        let outcome = ScanOutcome {
            code_type: normalized.code_type.clone(),
            is_url: is_url(&value),
            value,
            validation: validation.clone(),
        };
        debug!(
            code_type = %outcome.code_type,
            valid = outcome.validation.is_valid,
            "accepted detection"
        );

        self.record(NewScan::from_detection(normalized, validation));
        Some(outcome)
    }

    /// Closes the displayed result and starts the settle delay.
    pub fn dismiss(&mut self, now: Instant) {
        if !self.result_open {
            return;
        }
        self.result_open = false;
        self.settle_deadline = Some(now + self.settle_delay);
    }

    fn record(&mut self, scan: NewScan) {
        if self.writer.send(WriteJob::Save(scan)).is_err() {
            error!("History writer stopped, scan not saved");
        }
    }

    /// Waits for outstanding history writes.
    pub async fn flush(&mut self) {
        let (done, wait) = oneshot::channel();
        if self.writer.send(WriteJob::Flush(done)).is_err() || wait.await.is_err() {
            error!("History writer stopped before flushing");
        }
    }
}
