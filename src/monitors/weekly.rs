use super::{deliver, write_artifact, Delivery, RunOutcome};
use crate::aggregator::{Period, Scope};
use crate::alerts::{NotificationPolicy, Notifier};
use crate::analyzer::file_analyzer::display_name;
use crate::analyzer::FileAnalyzer;
use crate::catalog::{backup_catalog, weekly_system_catalog, PatternCatalog};
use crate::classifier::{LineClassifier, NumericExtractor};
use crate::config::WeeklyConfig;
use crate::error::{ConfigError, RunError};
use crate::findings::{Analysis, Timestamp};
use crate::resolver::{discover, lookback, modified_since, FilePattern};
use crate::summary::{BackupRunStats, WeeklySummary};
use chrono::Duration;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Rolls up application, backup and system logs of the last period into
/// one weekly report
#[derive(Debug, Clone)]
pub struct WeeklyReporter {
    config: WeeklyConfig,
    server_name: String,
}

impl WeeklyReporter {
    pub fn new(config: WeeklyConfig, server_name: impl Into<String>) -> Self {
        Self {
            config,
            server_name: server_name.into(),
        }
    }

    /// Build, store and send the weekly report
    ///
    /// # Errors
    ///
    /// `RunError::Artifact` when the report file cannot be written.
    pub fn run(&self, now: Timestamp, notifier: &dyn Notifier) -> Result<RunOutcome<WeeklySummary>, RunError> {
        let cutoff = lookback(now, Duration::days(i64::from(self.config.period_days)))?;
        info!("Building weekly report for files modified since {}", cutoff);

        let mut runs = BackupRunStats::default();
        for path in recent_files(&self.config.app_log_directory, "*.log", cutoff)? {
            match std::fs::read(&path) {
                Ok(bytes) => runs.record_file(&String::from_utf8_lossy(&bytes)),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        let extractor = NumericExtractor::new().map_err(ConfigError::from)?;
        let backup_analyzer = analyzer(backup_catalog()).map(|a| a.with_extraction(extractor))?;
        let backup_analyses = analyze_all(
            &backup_analyzer,
            &recent_files(&self.config.backup_directory, "backup_*.log", cutoff)?,
        );

        let system_analyzer = analyzer(weekly_system_catalog())?;
        let system_analyses = analyze_all(
            &system_analyzer,
            &recent_files(&self.config.system_directory, "*", cutoff)?,
        );

        let summary = WeeklySummary::build(
            Period { start: cutoff, end: now },
            now,
            runs,
            &backup_analyses,
            &system_analyses,
        );
        let rendered = summary.render();

        let report_file = write_artifact(
            &self.config.output_directory,
            &format!("weekly_report_{}.txt", now.format("%Y%m%d")),
            &rendered,
        )?;

        let policy = NotificationPolicy::new(&self.server_name, "");
        let severity = summary.severity();
        let delivery = if policy.should_notify(Scope::Weekly, severity) {
            deliver(
                notifier,
                &policy.subject_for(Scope::Weekly, severity),
                &rendered,
                policy.tag_for(Scope::Weekly, severity),
                std::slice::from_ref(&report_file),
            )
        } else {
            Delivery::Skipped
        };

        info!("Weekly report finished: {:?}", summary.assessment);

        Ok(RunOutcome {
            scope: Scope::Weekly,
            summary,
            severity,
            rendered,
            artifacts: vec![report_file],
            delivery,
        })
    }
}

fn analyzer(catalog: Result<PatternCatalog, regex::Error>) -> Result<FileAnalyzer, RunError> {
    let catalog = catalog.map_err(ConfigError::from)?;
    Ok(FileAnalyzer::new(LineClassifier::new(catalog)))
}

fn analyze_all(analyzer: &FileAnalyzer, files: &[PathBuf]) -> Vec<Analysis> {
    files
        .iter()
        .map(|path| analyzer.analyze_file(&display_name(path), path))
        .collect()
}

/// Files in `root` matching `pattern` and modified at or after `cutoff`
///
/// Enumeration failures are logged and treated as an empty directory.
fn recent_files(root: &Path, pattern: &str, cutoff: Timestamp) -> Result<Vec<PathBuf>, RunError> {
    let pattern = FilePattern::new(pattern)?;
    let discovered = discover(root, std::slice::from_ref(&pattern));
    if let Some(failure) = &discovered.failure {
        warn!("{}", failure);
    }
    let files: Vec<PathBuf> = discovered
        .files
        .into_iter()
        .filter(|path| modified_since(path, cutoff))
        .collect();
    debug!(
        "{} recent file(s) matching '{}' in {}",
        files.len(),
        pattern.as_str(),
        root.display()
    );
    Ok(files)
}
