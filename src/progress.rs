// Copyright 2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Download progress records and the broadcast channel carrying them.
//!
//! Each acquisition owns one [`DownloadProgress`] record, updated through a
//! [`ProgressReporter`] and mirrored onto a `tokio::sync::broadcast` channel
//! so any number of observers (CLI bar, UI polling, logs) can watch
//! independently. When no subscriber exists, updates are silently dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Lifecycle of one acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Pending,
    Downloading,
    Completed,
    Failed,
}

impl DownloadStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadStatus::Completed | DownloadStatus::Failed)
    }
}

/// One in-flight or just-completed acquisition. At most one non-terminal
/// record exists per module id at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub module_id: String,
    pub status: DownloadStatus,
    /// 0–100, derived from completed units over total units.
    pub progress_percent: u8,
    pub bytes_downloaded: u64,
    /// Estimate; revised as units arrive.
    pub total_bytes: u64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Which unit (book, file) is currently in flight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_unit: Option<String>,
    /// Units skipped during a best-effort acquisition.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failed_units: Vec<String>,
}

impl DownloadProgress {
    pub fn new(module_id: &str) -> Self {
        Self {
            module_id: module_id.to_string(),
            status: DownloadStatus::Pending,
            progress_percent: 0,
            bytes_downloaded: 0,
            total_bytes: 0,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
            current_unit: None,
            failed_units: Vec::new(),
        }
    }
}

/// Sender half of the progress broadcast channel.
pub type ProgressSender = tokio::sync::broadcast::Sender<DownloadProgress>;

/// Receiver half; subscribe via [`ProgressSender::subscribe`].
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<DownloadProgress>;

/// Create a progress broadcast channel. 128 buffered updates is plenty for
/// a 66-unit acquisition plus byte-count ticks.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(128)
}

/// Handle the engine gives an adapter for reporting progress.
///
/// Wraps the shared record so the engine can poll it while the adapter
/// mutates it. Every mutation is mirrored to the broadcast channel
/// synchronously (no coalescing).
#[derive(Clone)]
pub struct ProgressReporter {
    record: Arc<Mutex<DownloadProgress>>,
    tx: Option<ProgressSender>,
}

impl ProgressReporter {
    pub fn new(module_id: &str, tx: Option<ProgressSender>) -> Self {
        Self {
            record: Arc::new(Mutex::new(DownloadProgress::new(module_id))),
            tx,
        }
    }

    /// Current snapshot of the record.
    pub fn snapshot(&self) -> DownloadProgress {
        self.record.lock().expect("progress lock poisoned").clone()
    }

    /// Mark the acquisition as actively downloading.
    pub fn downloading(&self) {
        self.update(|r| r.status = DownloadStatus::Downloading);
    }

    /// A unit fetch is starting.
    pub fn unit_started(&self, unit: &str) {
        self.update(|r| r.current_unit = Some(unit.to_string()));
    }

    /// A unit arrived; report fractional progress and revise the byte total.
    pub fn unit_finished(&self, completed: usize, total: usize, bytes: u64) {
        self.update(|r| {
            r.bytes_downloaded += bytes;
            // Revise the total estimate from the running average.
            if completed > 0 {
                r.total_bytes = r.bytes_downloaded / completed as u64 * total as u64;
            }
            r.progress_percent = ((completed * 100) / total.max(1)).min(100) as u8;
        });
    }

    /// A unit fetch failed and was skipped (best-effort acquisition).
    pub fn unit_failed(&self, unit: &str) {
        self.update(|r| r.failed_units.push(unit.to_string()));
    }

    /// Terminal success.
    pub fn completed(&self) {
        self.update(|r| {
            r.status = DownloadStatus::Completed;
            r.progress_percent = 100;
            r.current_unit = None;
            r.completed_at = Some(Utc::now());
        });
    }

    /// Terminal failure with the causal error.
    pub fn failed(&self, error: &crate::error::EngineError) {
        let message = error.to_string();
        self.update(|r| {
            r.status = DownloadStatus::Failed;
            r.error = Some(message.clone());
            r.current_unit = None;
            r.completed_at = Some(Utc::now());
        });
    }

    fn update(&self, mutate: impl FnOnce(&mut DownloadProgress)) {
        let snapshot = {
            let mut record = self.record.lock().expect("progress lock poisoned");
            mutate(&mut record);
            record.clone()
        };
        if let Some(ref tx) = self.tx {
            // Errors mean nobody is listening; that is fine.
            let _ = tx.send(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(DownloadStatus::Completed.is_terminal());
        assert!(DownloadStatus::Failed.is_terminal());
        assert!(!DownloadStatus::Pending.is_terminal());
        assert!(!DownloadStatus::Downloading.is_terminal());
    }

    #[test]
    fn reporter_tracks_units_and_percent() {
        let reporter = ProgressReporter::new("web", None);
        reporter.downloading();
        reporter.unit_started("Genesis");
        reporter.unit_finished(1, 4, 1000);
        let snap = reporter.snapshot();
        assert_eq!(snap.status, DownloadStatus::Downloading);
        assert_eq!(snap.progress_percent, 25);
        assert_eq!(snap.bytes_downloaded, 1000);
        assert_eq!(snap.total_bytes, 4000);
    }

    #[test]
    fn broadcast_receives_each_update() {
        let (tx, mut rx) = channel();
        let reporter = ProgressReporter::new("web", Some(tx));
        reporter.downloading();
        reporter.completed();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.status, DownloadStatus::Downloading);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.status, DownloadStatus::Completed);
        assert_eq!(second.progress_percent, 100);
    }

    #[test]
    fn failed_records_cause_and_completion_time() {
        let reporter = ProgressReporter::new("web", None);
        reporter.failed(&crate::error::EngineError::Cancelled("web".into()));
        let snap = reporter.snapshot();
        assert_eq!(snap.status, DownloadStatus::Failed);
        assert!(snap.error.unwrap().contains("cancelled"));
        assert!(snap.completed_at.is_some());
    }
}
