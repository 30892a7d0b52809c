use super::{deliver, Delivery, RunOutcome};
use crate::aggregator::{Aggregator, Period, Report, Scope};
use crate::alerts::{NotificationPolicy, Notifier};
use crate::analyzer::file_analyzer::display_name;
use crate::analyzer::{FileAnalyzer, TimeWindow};
use crate::catalog::system_catalog;
use crate::classifier::LineClassifier;
use crate::config::SystemMonitorConfig;
use crate::error::{ConfigError, RunError};
use crate::findings::Timestamp;
use crate::report::{DisplayCaps, ReportRenderer};
use crate::resolver::{discover_recent, lookback, FilePattern};
use chrono::Duration;
use log::{debug, info};

/// Sweeps syslog-style files for recent critical, security and resource events
#[derive(Debug, Clone)]
pub struct SystemLogMonitor {
    config: SystemMonitorConfig,
    server_name: String,
    caps: DisplayCaps,
}

impl SystemLogMonitor {
    pub fn new(config: SystemMonitorConfig, server_name: impl Into<String>, caps: DisplayCaps) -> Self {
        Self {
            config,
            server_name: server_name.into(),
            caps,
        }
    }

    /// Run the sweep over lines from the last `hours_back` hours
    ///
    /// `None` uses the configured default window. Notification only happens
    /// at WARNING or above.
    pub fn run(
        &self,
        now: Timestamp,
        hours_back: Option<u32>,
        notifier: &dyn Notifier,
    ) -> Result<RunOutcome<Report>, RunError> {
        let hours_back = hours_back.unwrap_or(self.config.hours_back);
        let patterns = FilePattern::compile_all(&self.config.patterns)?;
        let discovered = discover_recent(&self.config.log_directory, &patterns, self.config.max_files);
        info!(
            "Found {} system log(s) in {}",
            discovered.files.len(),
            self.config.log_directory.display()
        );

        let window = TimeWindow::new(now, hours_back)?;
        let period = Period {
            start: lookback(now, Duration::hours(i64::from(hours_back)))?,
            end: now,
        };
        debug!("Considering lines since {}", window.cutoff());
        let catalog = system_catalog().map_err(ConfigError::from)?;
        let analyzer = FileAnalyzer::new(LineClassifier::new(catalog)).with_time_window(window);

        let analyses = discovered
            .files
            .iter()
            .map(|path| analyzer.analyze_file(&display_name(path), path))
            .collect();

        let report = Aggregator::new(Scope::SystemLogs, now, period)
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
        let delivery = if policy.should_notify(Scope::SystemLogs, severity) {
            deliver(
                notifier,
                &policy.subject_for(Scope::SystemLogs, severity),
                &rendered,
                policy.tag_for(Scope::SystemLogs, severity),
                &[],
            )
        } else {
            info!("System status {}, no notification needed", severity);
            Delivery::Skipped
        };

        Ok(RunOutcome {
            scope: Scope::SystemLogs,
            summary: report,
            severity,
            rendered,
            artifacts: Vec::new(),
            delivery,
        })
    }
}
