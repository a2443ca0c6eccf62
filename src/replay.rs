//! JSON-lines detector feed for driving a [`ScanSession`] without a camera.
//!
//! ```text
//! {"event":"frame","codes":[{"type":"qr","value":"https://example.com"}]}
//! {"event":"dismiss"}
//! {"event":"wait","ms":1000}
//! {"event":"focus"}
//! ```
//!
//! Time is virtual: only `wait` advances the clock handed to the session.

use crate::barcode::Detection;
use crate::error::{Error, Result};
use crate::session::{ScanOutcome, ScanSession};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum FeedEvent {
    Frame { codes: Vec<Detection> },
    Dismiss,
    Focus,
    Wait { ms: u64 },
}

/// Yields `(line_number, event)` pairs, skipping blanks and `#` comments.
pub struct FeedReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> FeedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for FeedReader<R> {
    type Item = Result<(usize, FeedEvent)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let line_no = self.line_no;
            return Some(
                serde_json::from_str(trimmed)
                    .map(|event| (line_no, event))
                    .map_err(|e| Error::InvalidEvent {
                        line: line_no,
                        message: e.to_string(),
                    }),
            );
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub frames: usize,
    pub accepted: usize,
    pub invalid: usize,
}

/// Applies feed events to a session on a virtual clock.
pub struct Replay<'a> {
    session: &'a mut ScanSession,
    clock: Instant,
    auto_dismiss: bool,
    summary: ReplaySummary,
}

impl<'a> Replay<'a> {
    pub fn new(session: &'a mut ScanSession) -> Self {
        Self {
            session,
            clock: Instant::now(),
            auto_dismiss: false,
            summary: ReplaySummary::default(),
        }
    }

    /// Dismiss every accepted result right after it is reported.
    pub fn auto_dismiss(mut self, enabled: bool) -> Self {
        self.auto_dismiss = enabled;
        self
    }

    pub fn apply(&mut self, event: FeedEvent) -> Option<ScanOutcome> {
        match event {
            FeedEvent::Frame { codes } => {
                self.summary.frames += 1;
                let outcome = self.session.on_codes(&codes, self.clock)?;
                self.summary.accepted += 1;
                if !outcome.validation.is_valid {
                    self.summary.invalid += 1;
                }
                if self.auto_dismiss {
                    self.session.dismiss(self.clock);
                }
                Some(outcome)
            }
            FeedEvent::Dismiss => {
                self.session.dismiss(self.clock);
                None
            }
            FeedEvent::Focus => {
                self.session.refresh_settings();
                None
            }
            FeedEvent::Wait { ms } => {
                self.clock += Duration::from_millis(ms);
                None
            }
        }
    }

    pub fn summary(&self) -> ReplaySummary {
        self.summary
    }
}
