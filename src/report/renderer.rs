//! Plain-text rendering of reports and checker artifacts
//!
//! Every function here is pure: it takes a finished `Report` and returns text.
//! Display caps limit how many example findings are printed per unit and
//! category; they never touch the totals.

use crate::aggregator::{Report, Scope};
use crate::findings::{Analysis, Category, Finding, Freshness, LineRef, Severity};
use crate::resolver::format_age;
use serde::{Deserialize, Serialize};

const RULE_WIDTH: usize = 50;
const SUBRULE_WIDTH: usize = 30;
const MAX_EXAMPLE_CHARS: usize = 200;

/// Maximum number of example findings printed per unit and category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayCaps {
    pub error: usize,
    pub warning: usize,
    pub critical: usize,
    pub security: usize,
    pub disk: usize,
    pub memory: usize,
    pub network: usize,
    /// Cap for every category without its own entry
    pub other: usize,
}

impl Default for DisplayCaps {
    fn default() -> Self {
        Self {
            error: 5,
            warning: 3,
            critical: 3,
            security: 5,
            disk: 3,
            memory: 3,
            network: 3,
            other: 5,
        }
    }
}

impl DisplayCaps {
    pub fn cap_for(&self, category: Category) -> usize {
        match category {
            Category::Error => self.error,
            Category::Warning => self.warning,
            Category::Critical => self.critical,
            Category::Security => self.security,
            Category::Disk => self.disk,
            Category::Memory => self.memory,
            Category::Network => self.network,
            _ => self.other,
        }
    }
}

/// Renders reports as plain text
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    caps: DisplayCaps,
    server_name: Option<String>,
}

impl ReportRenderer {
    pub fn new(caps: DisplayCaps) -> Self {
        Self {
            caps,
            server_name: None,
        }
    }

    /// Name the host in the report header
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    pub fn caps(&self) -> &DisplayCaps {
        &self.caps
    }

    /// Render the full report
    ///
    /// Layout: header, per-unit sections, totals, recommendations and a
    /// closing status line keyed by the overall severity.
    pub fn render(&self, report: &Report) -> String {
        let mut out = String::new();

        self.render_header(report, &mut out);

        for analysis in &report.analyses {
            self.render_unit(report.scope, analysis, &mut out);
        }

        render_totals(report, &mut out);

        if !report.recommendations.is_empty() {
            out.push_str("RECOMMENDATIONS\n");
            out.push_str(&format!("{}\n", "-".repeat(SUBRULE_WIDTH)));
            for (i, recommendation) in report.recommendations.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, recommendation));
            }
            out.push('\n');
        }

        out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
        out.push_str(&format!("{}\n", status_line(report.overall_severity)));
        out
    }

    fn render_header(&self, report: &Report, out: &mut String) {
        out.push_str(&format!("{}\n", report.scope.title()));
        out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
        out.push_str(&format!(
            "Generated: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        if let Some(server) = &self.server_name {
            out.push_str(&format!("Server: {}\n", server));
        }
        out.push_str(&format!(
            "Period: {} - {}\n",
            report.period.start.format("%Y-%m-%d %H:%M"),
            report.period.end.format("%Y-%m-%d %H:%M")
        ));
        if !report.checked_dates.is_empty() {
            out.push_str(&format!("Checked dates: {}\n", report.checked_dates.join(", ")));
        }
        out.push_str(&format!("Analyzed units: {}\n", report.analyses.len()));
        if let Some(failure) = &report.discovery_failure {
            out.push_str(&format!("Note: log discovery failed: {}\n", failure));
        }
        out.push('\n');
    }

    fn render_unit(&self, scope: Scope, analysis: &Analysis, out: &mut String) {
        let backup_scope = matches!(scope, Scope::BackupFiles | Scope::BackupLogs);
        if !backup_scope && !analysis.has_adverse_findings() {
            return;
        }

        out.push_str(&format!("{}\n", analysis.source()));
        out.push_str(&format!("{}\n", "-".repeat(SUBRULE_WIDTH)));

        if backup_scope {
            out.push_str(&format!(
                "Size: {:.2} MB\n",
                analysis.size_bytes() as f64 / (1024.0 * 1024.0)
            ));
            if let Some(modified) = analysis.modified() {
                out.push_str(&format!("Modified: {}\n", modified.format("%Y-%m-%d %H:%M:%S")));
            }
        }

        if scope == Scope::BackupLogs {
            let status = if analysis.completed() {
                "completed"
            } else {
                "incomplete"
            };
            out.push_str(&format!("Status: {}\n", status));
            if let Some(minutes) = analysis.duration_minutes() {
                out.push_str(&format!("Duration: {:.1} min\n", minutes));
            }
            if let Some(megabytes) = analysis.transferred_mb() {
                out.push_str(&format!("Transferred: {:.1} MB\n", megabytes));
            }
        }

        match analysis.freshness() {
            Some(Freshness::Stale { age }) => {
                out.push_str(&format!("Freshness: outdated ({} old)\n", format_age(age)));
            }
            Some(Freshness::Unreadable) => out.push_str("Freshness: unknown\n"),
            Some(Freshness::Fresh) | None => {}
        }

        for category in Category::ALL {
            if !category.is_adverse() {
                continue;
            }
            let count = analysis.count(category);
            if count == 0 {
                continue;
            }
            out.push_str(&format!("{}: {}\n", category.label(), count));
            let cap = self.caps.cap_for(category);
            for finding in analysis.findings_in(category).take(cap) {
                out.push_str(&format!("  - {}\n", describe(finding)));
            }
            if count > cap {
                out.push_str(&format!("  ... and {} more\n", count - cap));
            }
        }
        out.push('\n');
    }
}

fn render_totals(report: &Report, out: &mut String) {
    out.push_str("SUMMARY\n");
    out.push_str(&format!("{}\n", "-".repeat(SUBRULE_WIDTH)));
    if report.scope == Scope::BackupLogs {
        out.push_str(&format!(
            "Completed backups: {}/{}\n",
            report.completed_count(),
            report.analyses.len()
        ));
        let stale = report.stale_count();
        if stale > 0 {
            out.push_str(&format!("Outdated logs: {}\n", stale));
        }
    }
    for category in Category::ALL {
        if !category.is_adverse() {
            continue;
        }
        let count = report.total(category);
        if count > 0 || !category.is_unit_level() {
            out.push_str(&format!("{}: {}\n", category.label(), count));
        }
    }
    out.push('\n');
}

fn describe(finding: &Finding) -> String {
    let text = truncate_text(&finding.text, MAX_EXAMPLE_CHARS);
    match finding.line {
        LineRef::Line(n) => format!("line {}: {}", n, text),
        LineRef::NotApplicable => text,
    }
}

/// Closing status line for a severity
pub fn status_line(severity: Severity) -> String {
    let detail = match severity {
        Severity::Critical => "immediate attention required",
        Severity::Error => "review recommended",
        Severity::Warning => "monitoring recommended",
        Severity::Info => "for information only",
        Severity::Ok => "no problems found",
    };
    format!("STATUS: {} - {}", severity.status_word(), detail)
}

/// Truncate text to at most `max_chars` characters, on a char boundary
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Split a checker unit identifier `date/file` into its parts
fn split_unit(source: &str) -> (&str, &str) {
    source.split_once('/').unwrap_or((source, ""))
}

/// Activity log of a file check: one line per directory and file examined
pub fn render_activity_log(report: &Report, keywords_active: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Backup check activity log - {}\n",
        report.generated_at.format("%Y-%m-%d")
    ));
    out.push_str(&format!("{}\n\n", "=".repeat(RULE_WIDTH)));

    let mut current_date: Option<&str> = None;
    for analysis in &report.analyses {
        let (date, file) = split_unit(analysis.source());

        if analysis.count(Category::MissingDirectory) > 0 {
            out.push_str(&format!("Missing directory: {}\n", analysis.path().display()));
            current_date = Some(date);
            continue;
        }

        if current_date != Some(date) {
            let directory = analysis
                .path()
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| date.to_string());
            out.push_str(&format!("Checking directory: {}\n", directory));
            current_date = Some(date);
        }

        if analysis.count(Category::MissingFile) > 0 {
            out.push_str(&format!("Missing file: {}\n", file));
            continue;
        }

        out.push_str(&format!("Checking file: {}\n", analysis.path().display()));
        if keywords_active && !analysis.has_adverse_findings() {
            out.push_str(&format!("No errors in {}\n", file));
        }
    }
    out
}

/// Error/warning log of a file check: `<date> - <file> - <message>` per finding
pub fn render_errwarn_log(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Backup check errors/warnings - {}\n",
        report.generated_at.format("%Y-%m-%d")
    ));
    out.push_str(&format!("{}\n\n", "=".repeat(RULE_WIDTH)));

    let mut any = false;
    for analysis in &report.analyses {
        let (date, file) = split_unit(analysis.source());
        for finding in analysis.findings().iter().filter(|f| f.category.is_adverse()) {
            let message = match finding.line {
                LineRef::Line(n) => format!("Line {}: {}", n, finding.text),
                LineRef::NotApplicable => finding.text.clone(),
            };
            out.push_str(&format!("{} - {} - {}\n", date, file, message));
            any = true;
        }
    }
    if !any {
        out.push_str("No errors or warnings found.\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{Aggregator, Period};
    use chrono::{Local, TimeZone};

    fn fixed_time() -> crate::findings::Timestamp {
        Local
            .with_ymd_and_hms(2024, 6, 10, 8, 30, 0)
            .single()
            .unwrap()
    }

    fn aggregator(scope: Scope) -> Aggregator {
        let now = fixed_time();
        Aggregator::new(scope, now, Period { start: now, end: now })
    }

    fn analysis_with_errors(source: &str, errors: usize) -> Analysis {
        let mut analysis = Analysis::new(source, format!("/logs/{}", source));
        for i in 0..errors {
            analysis.push(Finding::for_line(
                source,
                i + 1,
                Category::Error,
                format!("error number {}", i),
                "error",
            ));
        }
        analysis
    }

    #[test]
    fn test_default_caps() {
        let caps = DisplayCaps::default();
        assert_eq!(caps.cap_for(Category::Error), 5);
        assert_eq!(caps.cap_for(Category::Warning), 3);
        assert_eq!(caps.cap_for(Category::Security), 5);
        assert_eq!(caps.cap_for(Category::ReadError), 5);
    }

    #[test]
    fn test_caps_limit_examples_not_totals() {
        let report = aggregator(Scope::SystemLogs).aggregate(vec![analysis_with_errors("syslog", 8)]);
        let text = ReportRenderer::new(DisplayCaps::default()).render(&report);

        assert!(text.contains("error number 4"));
        assert!(!text.contains("error number 5"));
        assert!(text.contains("... and 3 more"));
        assert!(text.contains("Errors: 8"));
        assert_eq!(report.total(Category::Error), 8);
    }

    #[test]
    fn test_render_is_deterministic() {
        let report = aggregator(Scope::SystemLogs).aggregate(vec![analysis_with_errors("syslog", 2)]);
        let renderer = ReportRenderer::new(DisplayCaps::default()).with_server_name("nas01");
        assert_eq!(renderer.render(&report), renderer.render(&report));
    }

    #[test]
    fn test_header_and_status_line() {
        let report = aggregator(Scope::SystemLogs).aggregate(vec![analysis_with_errors("syslog", 1)]);
        let text = ReportRenderer::new(DisplayCaps::default())
            .with_server_name("nas01")
            .render(&report);

        assert!(text.starts_with("SYSTEM MONITORING REPORT\n"));
        assert!(text.contains("Generated: 2024-06-10 08:30:00"));
        assert!(text.contains("Server: nas01"));
        assert!(text.trim_end().ends_with("STATUS: ERROR - review recommended"));
    }

    #[test]
    fn test_clean_system_units_are_omitted() {
        let report = aggregator(Scope::SystemLogs).aggregate(vec![
            analysis_with_errors("syslog", 0),
            analysis_with_errors("auth.log", 1),
        ]);
        let text = ReportRenderer::default().render(&report);
        assert!(!text.contains("syslog\n---"));
        assert!(text.contains("auth.log\n---"));
    }

    #[test]
    fn test_backup_unit_section_shows_status() {
        let mut analysis = Analysis::new("backup_1.log", "/logs/backup_1.log");
        analysis.push(Finding::for_line(
            "backup_1.log",
            7,
            Category::Success,
            "Backup completed",
            "Backup completed",
        ));
        analysis.record_duration(90.0);
        analysis.set_freshness(Freshness::Stale {
            age: chrono::Duration::hours(30),
        });
        let report = aggregator(Scope::BackupLogs).aggregate(vec![analysis]);
        let text = ReportRenderer::default().render(&report);

        assert!(text.contains("Status: completed"));
        assert!(text.contains("Duration: 90.0 min"));
        assert!(text.contains("Freshness: outdated"));
        assert!(text.contains("Completed backups: 1/1"));
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(status_line(Severity::Ok), "STATUS: OK - no problems found");
        assert!(status_line(Severity::Critical).starts_with("STATUS: CRITICAL"));
    }

    #[test]
    fn test_truncate_text_respects_char_boundaries() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("äöüäöüäöü", 6), "äöü...");
    }

    #[test]
    fn test_errwarn_log_lines() {
        let mut missing_dir = Analysis::new("2024-06-08", "/logs/2024-06-08");
        missing_dir.push(Finding::for_unit(
            "2024-06-08",
            Category::MissingDirectory,
            "Missing directory: /logs/2024-06-08",
        ));
        let mut keyword_hit = Analysis::new("2024-06-09/Nevaris.log", "/logs/2024-06-09/Nevaris.log");
        keyword_hit.push(Finding::for_line(
            "2024-06-09/Nevaris.log",
            3,
            Category::Error,
            "Access denied",
            "denied",
        ));
        let report = aggregator(Scope::BackupFiles).aggregate(vec![keyword_hit, missing_dir]);
        let text = render_errwarn_log(&report);

        assert!(text.contains("2024-06-09 - Nevaris.log - Line 3: Access denied\n"));
        assert!(text.contains("2024-06-08 -  - Missing directory: /logs/2024-06-08\n"));
        assert!(!text.contains("No errors or warnings found."));
    }

    #[test]
    fn test_errwarn_log_without_findings() {
        let report = aggregator(Scope::BackupFiles).aggregate(vec![Analysis::new(
            "2024-06-09/Nevaris.log",
            "/logs/2024-06-09/Nevaris.log",
        )]);
        assert!(render_errwarn_log(&report).ends_with("No errors or warnings found.\n"));
    }

    #[test]
    fn test_activity_log() {
        let clean = Analysis::new("2024-06-09/Nevaris.log", "/logs/2024-06-09/Nevaris.log");
        let mut missing = Analysis::new("2024-06-09/Share_MSSQL.log", "/logs/2024-06-09/Share_MSSQL.log");
        missing.push(Finding::for_unit(
            "2024-06-09/Share_MSSQL.log",
            Category::MissingFile,
            "Missing file: Share_MSSQL.log",
        ));
        let report = aggregator(Scope::BackupFiles).aggregate(vec![clean, missing]);
        let text = render_activity_log(&report, true);

        assert!(text.contains("Checking directory: /logs/2024-06-09\n"));
        assert!(text.contains("Checking file: /logs/2024-06-09/Nevaris.log\n"));
        assert!(text.contains("No errors in Nevaris.log\n"));
        assert!(text.contains("Missing file: Share_MSSQL.log\n"));
        assert_eq!(text.matches("Checking directory").count(), 1);
    }
}
