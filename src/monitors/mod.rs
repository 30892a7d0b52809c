//! End-to-end monitoring flows
//!
//! Each flow resolves its units, analyzes them, aggregates a report, renders
//! it, writes its artifacts and hands the result to a `Notifier`. A failed
//! notification is recorded in the outcome and never fails the run.

/// Date-partitioned required-file check
pub mod backup_files;

/// Backup job log monitoring
pub mod backup_logs;

/// Time-windowed system log sweep
pub mod system_logs;

/// Weekly roll-up
pub mod weekly;

pub use backup_files::BackupFileCheck;
pub use backup_logs::BackupLogMonitor;
pub use system_logs::SystemLogMonitor;
pub use weekly::WeeklyReporter;

use crate::aggregator::Scope;
use crate::alerts::{NotificationTag, Notifier};
use crate::error::RunError;
use crate::findings::Severity;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to the notification of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The flow's policy decided not to notify
    Skipped,
    Failed(String),
}

/// Result of one flow run
#[derive(Debug)]
pub struct RunOutcome<R> {
    pub scope: Scope,
    /// Aggregated data the rendering was produced from
    pub summary: R,
    pub severity: Severity,
    pub rendered: String,
    /// Files written by the run
    pub artifacts: Vec<PathBuf>,
    pub delivery: Delivery,
}

pub(crate) fn deliver(
    notifier: &dyn Notifier,
    subject: &str,
    body: &str,
    tag: NotificationTag,
    attachments: &[PathBuf],
) -> Delivery {
    match notifier.notify(subject, body, tag, attachments) {
        Ok(()) => {
            info!("Notification sent: {}", subject);
            Delivery::Sent
        }
        Err(e) => {
            error!("Failed to send notification '{}': {}", subject, e);
            Delivery::Failed(e.to_string())
        }
    }
}

pub(crate) fn write_artifact(directory: &Path, name: &str, content: &str) -> Result<PathBuf, RunError> {
    let path = directory.join(name);
    fs::create_dir_all(directory).map_err(|source| RunError::Artifact {
        path: directory.to_path_buf(),
        source,
    })?;
    fs::write(&path, content).map_err(|source| RunError::Artifact {
        path: path.clone(),
        source,
    })?;
    info!("Wrote {}", path.display());
    Ok(path)
}
