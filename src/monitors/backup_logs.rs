use super::{deliver, Delivery, RunOutcome};
use crate::aggregator::{Aggregator, Period, Report, Scope};
use crate::alerts::{NotificationPolicy, Notifier};
use crate::analyzer::file_analyzer::display_name;
use crate::analyzer::FileAnalyzer;
use crate::catalog::backup_catalog;
use crate::classifier::{LineClassifier, NumericExtractor};
use crate::config::BackupMonitorConfig;
use crate::error::{ConfigError, RunError};
use crate::findings::Timestamp;
use crate::report::{DisplayCaps, ReportRenderer};
use crate::resolver::{check_freshness, discover_recent, lookback, FilePattern};
use chrono::Duration;
use log::{info, warn};

/// Analyzes the most recent backup job logs for errors, completion and age
#[derive(Debug, Clone)]
pub struct BackupLogMonitor {
    config: BackupMonitorConfig,
    server_name: String,
    caps: DisplayCaps,
}

impl BackupLogMonitor {
    pub fn new(config: BackupMonitorConfig, server_name: impl Into<String>, caps: DisplayCaps) -> Self {
        Self {
            config,
            server_name: server_name.into(),
            caps,
        }
    }

    /// Run the monitor relative to `now`
    ///
    /// Finding no backup logs at all is reported as CRITICAL rather than
    /// returned as an error. Only an invalid file pattern fails the run.
    pub fn run(&self, now: Timestamp, notifier: &dyn Notifier) -> Result<RunOutcome<Report>, RunError> {
        let pattern = FilePattern::new(&self.config.pattern)?;
        let discovered = discover_recent(
            &self.config.log_directory,
            std::slice::from_ref(&pattern),
            self.config.max_files,
        );
        if discovered.is_empty() {
            warn!(
                "No backup logs matching '{}' in {}",
                pattern.as_str(),
                self.config.log_directory.display()
            );
        } else {
            info!("Found {} backup log(s)", discovered.files.len());
        }

        let catalog = backup_catalog().map_err(ConfigError::from)?;
        let extractor = NumericExtractor::new().map_err(ConfigError::from)?;
        let analyzer = FileAnalyzer::new(LineClassifier::new(catalog)).with_extraction(extractor);
        let max_age = Duration::hours(i64::from(self.config.max_age_hours));
        let period = Period {
            start: lookback(now, max_age)?,
            end: now,
        };

        let analyses = discovered
            .files
            .iter()
            .map(|path| {
                let mut analysis = analyzer.analyze_file(&display_name(path), path);
                analysis.set_freshness(check_freshness(path, now, max_age));
                analysis
            })
            .collect();

        let report = Aggregator::new(Scope::BackupLogs, now, period)
            .with_discovery(
                discovered.files.len(),
                discovered.failure.as_ref().map(|e| e.to_string()),
            )
            .aggregate(analyses);

        let rendered = ReportRenderer::new(self.caps.clone())
            .with_server_name(&self.server_name)
            .render(&report);

        let policy = NotificationPolicy::new(&self.server_name, "");
        let severity = report.overall_severity;
        let delivery = if policy.should_notify(Scope::BackupLogs, severity) {
            deliver(
                notifier,
                &policy.subject_for(Scope::BackupLogs, severity),
                &rendered,
                policy.tag_for(Scope::BackupLogs, severity),
                &[],
            )
        } else {
            Delivery::Skipped
        };

        info!(
            "Backup monitoring finished: {} ({}/{} completed)",
            severity,
            report.completed_count(),
            report.analyses.len()
        );

        Ok(RunOutcome {
            scope: Scope::BackupLogs,
            summary: report,
            severity,
            rendered,
            artifacts: Vec::new(),
            delivery,
        })
    }
}
