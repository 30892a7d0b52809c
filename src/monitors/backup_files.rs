use super::{deliver, write_artifact, Delivery, RunOutcome};
use crate::aggregator::{Aggregator, Period, Report, Scope};
use crate::alerts::{NotificationPolicy, Notifier};
use crate::analyzer::FileAnalyzer;
use crate::catalog::PatternCatalog;
use crate::classifier::LineClassifier;
use crate::config::BackupCheckConfig;
use crate::error::{ConfigError, RunError};
use crate::findings::{Category, Timestamp};
use crate::report::{render_activity_log, render_errwarn_log, DisplayCaps, ReportRenderer};
use crate::resolver::DateWindow;
use chrono::{Local, NaiveDate};
use log::{info, warn};

/// Checks that every required log exists in each date directory and scans
/// the logs for configured keywords
#[derive(Debug, Clone)]
pub struct BackupFileCheck {
    config: BackupCheckConfig,
    server_name: String,
    caps: DisplayCaps,
}

impl BackupFileCheck {
    pub fn new(config: BackupCheckConfig, server_name: impl Into<String>, caps: DisplayCaps) -> Self {
        Self {
            config,
            server_name: server_name.into(),
            caps,
        }
    }

    /// Run the check relative to `now`
    ///
    /// # Errors
    ///
    /// `ConfigError::Incomplete` when no required files are configured, and
    /// `RunError::Artifact` when the activity or error/warning log cannot be
    /// written. Missing, empty and unreadable logs are findings, not errors.
    pub fn run(&self, now: Timestamp, notifier: &dyn Notifier) -> Result<RunOutcome<Report>, RunError> {
        let required_files = self.config.resolve_required_files()?;
        if required_files.is_empty() {
            return Err(ConfigError::Incomplete("no required log files configured".to_string()).into());
        }

        let keywords = self.config.resolve_keywords()?;
        if keywords.is_empty() {
            warn!("No keywords configured - checking file existence only");
        }
        let catalog =
            PatternCatalog::from_keywords(Category::Error, &keywords).map_err(ConfigError::from)?;
        let analyzer = FileAnalyzer::new(LineClassifier::new(catalog));

        let window = DateWindow::new(self.config.days_to_check, self.config.start_day_offset);
        let days = window.dates(now.date_naive());
        if days.len() != self.config.days_to_check as usize {
            return Err(ConfigError::ValidationError(format!(
                "date window of {} day(s) starting {} day(s) back is out of range",
                self.config.days_to_check, self.config.start_day_offset
            ))
            .into());
        }
        let period = period_of(&days, now);
        let dates: Vec<String> = days
            .iter()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .collect();
        info!(
            "Checking {} date(s) in {}: {}",
            dates.len(),
            self.config.log_directory.display(),
            dates.join(", ")
        );

        let analyses = dates
            .iter()
            .flat_map(|date| {
                analyzer.analyze_date_directory(&self.config.log_directory, date, &required_files)
            })
            .collect();

        let report = Aggregator::new(Scope::BackupFiles, now, period)
            .with_checked_dates(dates)
            .aggregate(analyses);

        let rendered = ReportRenderer::new(self.caps.clone())
            .with_server_name(&self.server_name)
            .render(&report);

        let today = now.format("%Y-%m-%d").to_string();
        let activity_log = write_artifact(
            &self.config.output_directory,
            &format!("{}-Logcheck.log", today),
            &render_activity_log(&report, !keywords.is_empty()),
        )?;
        let errwarn_log = write_artifact(
            &self.config.output_directory,
            &format!("{}-ErrWarn.log", today),
            &render_errwarn_log(&report),
        )?;

        let policy = NotificationPolicy::new(&self.server_name, &self.config.subject_prefix);
        let severity = report.overall_severity;
        let attachments = if report.adverse_total() > 0 {
            vec![errwarn_log.clone()]
        } else {
            Vec::new()
        };
        let delivery = if policy.should_notify(Scope::BackupFiles, severity) {
            deliver(
                notifier,
                &policy.subject_for(Scope::BackupFiles, severity),
                &rendered,
                policy.tag_for(Scope::BackupFiles, severity),
                &attachments,
            )
        } else {
            Delivery::Skipped
        };

        info!(
            "Backup file check finished: {} ({} problem(s))",
            severity,
            report.adverse_total()
        );

        Ok(RunOutcome {
            scope: Scope::BackupFiles,
            summary: report,
            severity,
            rendered,
            artifacts: vec![activity_log, errwarn_log],
            delivery,
        })
    }
}

/// From midnight of the oldest checked date to the end of the newest one
fn period_of(days: &[NaiveDate], now: Timestamp) -> Period {
    let at = |date: &NaiveDate, h, m, sec| {
        date.and_hms_opt(h, m, sec)
            .and_then(|time| time.and_local_timezone(Local).earliest())
    };
    let start = days.iter().min().and_then(|oldest| at(oldest, 0, 0, 0));
    let end = days.iter().max().and_then(|newest| at(newest, 23, 59, 59));
    Period {
        start: start.unwrap_or(now),
        end: end.unwrap_or(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{MockNotifier, NotificationTag};
    use crate::error::NotifyError;
    use crate::findings::Severity;
    use chrono::{Local, TimeZone};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn now() -> Timestamp {
        Local
            .with_ymd_and_hms(2024, 6, 10, 7, 0, 0)
            .single()
            .unwrap()
    }

    fn check(root: &Path, required: &[&str], keywords: &[&str]) -> BackupFileCheck {
        let config = BackupCheckConfig {
            log_directory: root.join("logs"),
            required_files: required.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            days_to_check: 1,
            start_day_offset: 1,
            output_directory: root.join("out"),
            ..BackupCheckConfig::default()
        };
        BackupFileCheck::new(config, "nas01", DisplayCaps::default())
    }

    fn write_log(root: &Path, date: &str, name: &str, content: &str) {
        let dir = root.join("logs").join(date);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_missing_file_and_keyword_hit() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "2024-06-09", "A.log", "start\nAccess Denied for share\nend\n");

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .withf(|subject, _body, tag, attachments| {
                subject == "Backup-Check nas01 - CRITICAL"
                    && *tag == NotificationTag::Error
                    && attachments.len() == 1
            })
            .returning(|_, _, _, _| Ok(()));

        let outcome = check(dir.path(), &["A.log", "B.log"], &["denied"])
            .run(now(), &notifier)
            .unwrap();

        assert_eq!(outcome.severity, Severity::Critical);
        assert_eq!(outcome.delivery, Delivery::Sent);
        assert_eq!(outcome.summary.total(Category::Error), 1);
        assert_eq!(outcome.summary.total(Category::MissingFile), 1);
        assert_eq!(outcome.summary.checked_dates, vec!["2024-06-09"]);

        let errwarn = fs::read_to_string(dir.path().join("out/2024-06-10-ErrWarn.log")).unwrap();
        assert!(errwarn.contains("2024-06-09 - A.log - Line 2: Access Denied for share"));
        assert!(errwarn.contains("2024-06-09 - B.log - Missing file: B.log"));

        let activity = fs::read_to_string(dir.path().join("out/2024-06-10-Logcheck.log")).unwrap();
        assert!(activity.contains("Missing file: B.log"));
        assert_eq!(outcome.artifacts.len(), 2);
    }

    #[test]
    fn test_clean_run_reports_ok_without_attachment() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "2024-06-09", "A.log", "all good\n");

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .withf(|subject, _body, tag, attachments| {
                subject == "Backup-Check nas01 - OK"
                    && *tag == NotificationTag::Success
                    && attachments.is_empty()
            })
            .returning(|_, _, _, _| Ok(()));

        let outcome = check(dir.path(), &["A.log"], &["error"])
            .run(now(), &notifier)
            .unwrap();
        assert_eq!(outcome.severity, Severity::Ok);

        let errwarn = fs::read_to_string(dir.path().join("out/2024-06-10-ErrWarn.log")).unwrap();
        assert!(errwarn.contains("No errors or warnings found."));
    }

    #[test]
    fn test_missing_directory_is_critical() {
        let dir = TempDir::new().unwrap();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_, _, _, _| Ok(()));

        let outcome = check(dir.path(), &["A.log", "B.log"], &["error"])
            .run(now(), &notifier)
            .unwrap();

        assert_eq!(outcome.severity, Severity::Critical);
        assert_eq!(outcome.summary.total(Category::MissingDirectory), 1);
        assert_eq!(outcome.summary.total(Category::MissingFile), 0);
    }

    #[test]
    fn test_empty_file_is_error() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "2024-06-09", "A.log", "");
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_, _, _, _| Ok(()));

        let outcome = check(dir.path(), &["A.log"], &["error"])
            .run(now(), &notifier)
            .unwrap();
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(outcome.summary.total(Category::EmptyFile), 1);
    }

    #[test]
    fn test_empty_required_list_is_incomplete() {
        let dir = TempDir::new().unwrap();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let result = check(dir.path(), &[], &["error"]).run(now(), &notifier);
        assert!(matches!(
            result,
            Err(RunError::Config(ConfigError::Incomplete(_)))
        ));
    }

    #[test]
    fn test_empty_keywords_check_existence_only() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "2024-06-09", "A.log", "fatal error everywhere\n");
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_, _, _, _| Ok(()));

        let outcome = check(dir.path(), &["A.log"], &[]).run(now(), &notifier).unwrap();
        assert_eq!(outcome.severity, Severity::Ok);
        assert_eq!(outcome.summary.adverse_total(), 0);
    }

    #[test]
    fn test_notification_failure_does_not_fail_run() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "2024-06-09", "A.log", "ok\n");
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_, _, _, _| Err(NotifyError::DeliveryFailed("relay down".to_string())));

        let outcome = check(dir.path(), &["A.log"], &["error"])
            .run(now(), &notifier)
            .unwrap();
        assert!(matches!(outcome.delivery, Delivery::Failed(ref msg) if msg.contains("relay down")));
    }

    #[test]
    fn test_unwritable_output_is_artifact_error() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "2024-06-09", "A.log", "ok\n");
        fs::write(dir.path().join("out"), "not a directory").unwrap();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let result = check(dir.path(), &["A.log"], &["error"]).run(now(), &notifier);
        assert!(matches!(result, Err(RunError::Artifact { .. })));
    }

    #[test]
    fn test_period_spans_checked_days() {
        let dir = TempDir::new().unwrap();
        write_log(dir.path(), "2024-06-09", "A.log", "ok\n");
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_, _, _, _| Ok(()));

        let mut check = check(dir.path(), &["A.log"], &["error"]);
        check.config.days_to_check = 2;
        let outcome = check.run(now(), &notifier).unwrap();

        let period = outcome.summary.period;
        assert_eq!(
            period.start,
            Local.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).single().unwrap()
        );
        assert_eq!(
            period.end,
            Local.with_ymd_and_hms(2024, 6, 9, 23, 59, 59).single().unwrap()
        );
        assert!(outcome.rendered.contains("Period: 2024-06-08 00:00 - 2024-06-09 23:59"));
    }

    #[test]
    fn test_offset_beyond_date_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(0);

        let mut check = check(dir.path(), &["A.log"], &["error"]);
        check.config.start_day_offset = 200_000_000;
        let result = check.run(now(), &notifier);
        assert!(matches!(
            result,
            Err(RunError::Config(ConfigError::ValidationError(_)))
        ));
    }
}
