use crate::aggregator::Scope;
use crate::alerts::NotificationTag;
use crate::findings::Severity;

/// Decides whether, how and under which subject a run is reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPolicy {
    server_name: String,
    subject_prefix: String,
}

impl NotificationPolicy {
    pub fn new(server_name: impl Into<String>, subject_prefix: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            subject_prefix: subject_prefix.into(),
        }
    }

    /// The system sweep stays quiet below WARNING; every other flow always reports
    pub fn should_notify(&self, scope: Scope, severity: Severity) -> bool {
        match scope {
            Scope::SystemLogs => severity >= Severity::Warning,
            Scope::BackupFiles | Scope::BackupLogs | Scope::Weekly => true,
        }
    }

    /// Weekly reports are always informational
    pub fn tag_for(&self, scope: Scope, severity: Severity) -> NotificationTag {
        match scope {
            Scope::Weekly => NotificationTag::Info,
            _ => NotificationTag::from(severity),
        }
    }

    pub fn subject_for(&self, scope: Scope, severity: Severity) -> String {
        let status = severity.status_word();
        match scope {
            Scope::BackupFiles => format!(
                "{} {} - {}",
                self.subject_prefix, self.server_name, status
            ),
            Scope::BackupLogs => format!("Backup monitoring: {}", status),
            Scope::SystemLogs => format!("System monitoring: {}", status),
            Scope::Weekly => format!("Weekly monitoring report {} - {}", self.server_name, status),
        }
    }
}
