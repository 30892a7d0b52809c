use crate::error::NotifyError;
use crate::findings::Severity;
use crate::report::truncate_text;
use chrono::Local;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const MAX_SUBJECT_CHARS: usize = 256;
const MAX_FILE_STEM_CHARS: usize = 80;

/// Message class attached to a notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationTag {
    Error,
    Warning,
    Success,
    Info,
}

impl From<Severity> for NotificationTag {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical | Severity::Error => NotificationTag::Error,
            Severity::Warning => NotificationTag::Warning,
            Severity::Ok => NotificationTag::Success,
            Severity::Info => NotificationTag::Info,
        }
    }
}

impl fmt::Display for NotificationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationTag::Error => "error",
            NotificationTag::Warning => "warning",
            NotificationTag::Success => "success",
            NotificationTag::Info => "info",
        };
        f.write_str(name)
    }
}

/// Collaborator that delivers a finished report
///
/// Delivery failures are returned to the caller, which logs them and records
/// them in the run outcome. They never abort a run.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(
        &self,
        subject: &str,
        body: &str,
        tag: NotificationTag,
        attachments: &[PathBuf],
    ) -> Result<(), NotifyError>;
}

/// Writes notifications to the application log only
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(
        &self,
        subject: &str,
        body: &str,
        tag: NotificationTag,
        attachments: &[PathBuf],
    ) -> Result<(), NotifyError> {
        info!(
            "NOTIFICATION [{}] {} ({} bytes, {} attachment(s))",
            tag,
            truncate_text(subject, MAX_SUBJECT_CHARS),
            body.len(),
            attachments.len()
        );
        debug!("Notification body:\n{}", body);
        Ok(())
    }
}

/// Drops each notification as a text file into an outbox directory
///
/// A separate delivery agent (mail relay, chat bridge) is expected to pick the
/// files up. Attachments are referenced by path, not copied.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    directory: PathBuf,
}

impl OutboxNotifier {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn file_name(subject: &str, tag: NotificationTag) -> String {
        let stem: String = subject
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!(
            "{}-{}-{}.txt",
            Local::now().format("%Y%m%dT%H%M%S%.6f"),
            tag,
            truncate_text(&stem, MAX_FILE_STEM_CHARS).replace('.', "_")
        )
    }
}

impl Notifier for OutboxNotifier {
    fn notify(
        &self,
        subject: &str,
        body: &str,
        tag: NotificationTag,
        attachments: &[PathBuf],
    ) -> Result<(), NotifyError> {
        fs::create_dir_all(&self.directory)?;

        let mut content = String::new();
        content.push_str(&format!(
            "Subject: {}\n",
            truncate_text(subject, MAX_SUBJECT_CHARS)
        ));
        content.push_str(&format!("Tag: {}\n", tag));
        for attachment in attachments {
            content.push_str(&format!("Attachment: {}\n", attachment.display()));
        }
        content.push('\n');
        content.push_str(body);
        if !body.ends_with('\n') {
            content.push('\n');
        }

        let path = self.directory.join(Self::file_name(subject, tag));
        fs::write(&path, content).map_err(|e| {
            NotifyError::DeliveryFailed(format!("cannot write {}: {}", path.display(), e))
        })?;
        info!("Notification '{}' written to {}", subject, path.display());
        Ok(())
    }
}
