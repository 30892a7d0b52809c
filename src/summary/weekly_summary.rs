//! Weekly roll-up statistics
//!
//! Everything here is computed from data the weekly flow has already
//! collected: application log lines, backup log analyses and system log
//! analyses. No I/O happens in this module.

use crate::aggregator::{count_totals, Period};
use crate::findings::{Analysis, Category, Severity, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_ERROR_SUMMARY: usize = 10;
const FAILURE_RATE_THRESHOLD: f64 = 10.0;
const LONG_BACKUP_MINUTES: f64 = 180.0;
const RULE_WIDTH: usize = 60;
const SUBRULE_WIDTH: usize = 40;

/// How an application log line describes a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLine {
    Successful,
    Failed,
    Warning,
    /// Mentions a backup without a verdict; still counts as a run
    Unclassified,
}

/// Classify a line that mentions a backup; `None` for unrelated lines
pub fn classify_run_line(line: &str) -> Option<RunLine> {
    let lower = line.to_lowercase();
    if !lower.contains("backup") {
        return None;
    }
    let outcome = if lower.contains("successful") || lower.contains("completed") {
        RunLine::Successful
    } else if lower.contains("error") || lower.contains("failed") {
        RunLine::Failed
    } else if lower.contains("warning") {
        RunLine::Warning
    } else {
        RunLine::Unclassified
    };
    Some(outcome)
}

/// Backup run counts from application logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupRunStats {
    pub log_files_analyzed: usize,
    pub total_log_entries: usize,
    pub total_runs: usize,
    pub successful_runs: usize,
    pub failed_runs: usize,
    pub warnings: usize,
    /// Lines of failed runs in the order they were read
    pub error_summary: Vec<String>,
}

impl BackupRunStats {
    /// Account for one application log file's content
    pub fn record_file(&mut self, content: &str) {
        self.log_files_analyzed += 1;
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.record_line(line);
        }
    }

    pub fn record_line(&mut self, line: &str) {
        self.total_log_entries += 1;
        let Some(outcome) = classify_run_line(line) else {
            return;
        };
        self.total_runs += 1;
        match outcome {
            RunLine::Successful => self.successful_runs += 1,
            RunLine::Failed => {
                self.failed_runs += 1;
                self.error_summary.push(line.to_string());
            }
            RunLine::Warning => self.warnings += 1,
            RunLine::Unclassified => {}
        }
    }

    pub fn success_rate(&self) -> Option<f64> {
        rate(self.successful_runs, self.total_runs)
    }

    pub fn failure_rate(&self) -> Option<f64> {
        rate(self.failed_runs, self.total_runs)
    }

    /// The most recent failure lines
    pub fn recent_errors(&self) -> &[String] {
        let start = self.error_summary.len().saturating_sub(MAX_ERROR_SUMMARY);
        &self.error_summary[start..]
    }
}

fn rate(part: usize, total: usize) -> Option<f64> {
    (total > 0).then(|| part as f64 / total as f64 * 100.0)
}

/// Size and timing figures from backup job logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub largest_backup_mb: Option<f64>,
    pub average_duration_minutes: Option<f64>,
    pub total_transferred_mb: f64,
}

impl PerformanceMetrics {
    pub fn from_analyses(analyses: &[Analysis]) -> Self {
        let largest_backup_mb = analyses
            .iter()
            .map(|a| a.size_bytes() as f64 / (1024.0 * 1024.0))
            .fold(None, |max: Option<f64>, size| {
                Some(max.map_or(size, |m| m.max(size)))
            });

        let durations: Vec<f64> = analyses.iter().filter_map(|a| a.duration_minutes()).collect();
        let average_duration_minutes = (!durations.is_empty())
            .then(|| durations.iter().sum::<f64>() / durations.len() as f64);

        let total_transferred_mb = analyses.iter().filter_map(|a| a.transferred_mb()).sum();

        Self {
            largest_backup_mb,
            average_duration_minutes,
            total_transferred_mb,
        }
    }
}

/// Overall grade of a week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assessment {
    Excellent,
    Good,
    NeedsImprovement,
    Critical,
}

impl Assessment {
    pub fn assess(runs: &BackupRunStats, system: &BTreeMap<Category, usize>) -> Self {
        let critical = system.get(&Category::Critical).copied().unwrap_or(0);
        let security = system.get(&Category::Security).copied().unwrap_or(0);

        if runs.failed_runs == 0 && critical == 0 && security < 3 {
            Assessment::Excellent
        } else if runs.failed_runs < 2 && critical == 0 {
            Assessment::Good
        } else if critical > 0 {
            Assessment::Critical
        } else {
            Assessment::NeedsImprovement
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Assessment::Excellent => Severity::Ok,
            Assessment::Good => Severity::Info,
            Assessment::NeedsImprovement => Severity::Warning,
            Assessment::Critical => Severity::Critical,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Assessment::Excellent => "EXCELLENT - system is running optimally",
            Assessment::Good => "GOOD - minor issues, but stable",
            Assessment::NeedsImprovement => "NEEDS IMPROVEMENT - increase monitoring",
            Assessment::Critical => "CRITICAL - immediate attention required",
        }
    }
}

/// Seven-day roll-up ready for rendering
#[derive(Debug, Clone)]
pub struct WeeklySummary {
    pub period: Period,
    pub generated_at: Timestamp,
    pub runs: BackupRunStats,
    pub performance: PerformanceMetrics,
    /// Finding counts from the system logs
    pub system: BTreeMap<Category, usize>,
    pub recommendations: Vec<String>,
    pub assessment: Assessment,
}

impl WeeklySummary {
    pub fn build(
        period: Period,
        generated_at: Timestamp,
        runs: BackupRunStats,
        backup_analyses: &[Analysis],
        system_analyses: &[Analysis],
    ) -> Self {
        let performance = PerformanceMetrics::from_analyses(backup_analyses);
        let system = count_totals(system_analyses);
        let recommendations = weekly_recommendations(&runs, &performance, &system);
        let assessment = Assessment::assess(&runs, &system);
        Self {
            period,
            generated_at,
            runs,
            performance,
            system,
            recommendations,
            assessment,
        }
    }

    pub fn severity(&self) -> Severity {
        self.assessment.severity()
    }

    fn system_count(&self, category: Category) -> usize {
        self.system.get(&category).copied().unwrap_or(0)
    }

    /// Plain-text weekly report
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("WEEKLY MONITORING REPORT\n");
        out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
        out.push_str(&format!(
            "Period: {} to {}\n",
            self.period.start.format("%Y-%m-%d"),
            self.period.end.format("%Y-%m-%d")
        ));
        out.push_str(&format!(
            "Generated: {}\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));

        section(&mut out, "DATA OVERVIEW");
        out.push_str(&format!("Log files analyzed: {}\n", self.runs.log_files_analyzed));
        out.push_str(&format!("Log entries: {}\n\n", self.runs.total_log_entries));

        section(&mut out, "BACKUP STATISTICS");
        out.push_str(&format!("Backup runs: {}\n", self.runs.total_runs));
        out.push_str(&format!("Successful: {}\n", self.runs.successful_runs));
        out.push_str(&format!("Failed: {}\n", self.runs.failed_runs));
        out.push_str(&format!("Warnings: {}\n", self.runs.warnings));
        if let Some(success_rate) = self.runs.success_rate() {
            out.push_str(&format!("Success rate: {:.1}%\n", success_rate));
        }
        out.push('\n');

        section(&mut out, "PERFORMANCE");
        if let Some(minutes) = self.performance.average_duration_minutes {
            out.push_str(&format!(
                "Average backup duration: {:02}:{:02}\n",
                (minutes / 60.0) as u64,
                (minutes % 60.0) as u64
            ));
        }
        if self.performance.total_transferred_mb > 0.0 {
            out.push_str(&format!(
                "Total data transferred: {:.2} GB\n",
                self.performance.total_transferred_mb / 1024.0
            ));
        }
        if let Some(largest) = self.performance.largest_backup_mb {
            out.push_str(&format!("Largest backup log: {:.1} MB\n", largest));
        }
        out.push('\n');

        let system_categories = [
            Category::Critical,
            Category::Security,
            Category::Disk,
            Category::Memory,
            Category::Network,
        ];
        if system_categories.iter().any(|c| self.system_count(*c) > 0) {
            section(&mut out, "SYSTEM EVENTS");
            for category in system_categories {
                out.push_str(&format!(
                    "{}: {}\n",
                    category.label(),
                    self.system_count(category)
                ));
            }
            out.push('\n');
        }

        let recent_errors = self.runs.recent_errors();
        if !recent_errors.is_empty() {
            section(&mut out, "RECENT ERRORS");
            for line in recent_errors {
                out.push_str(&format!("- {}\n", line));
            }
            out.push('\n');
        }

        section(&mut out, "RECOMMENDATIONS");
        for recommendation in &self.recommendations {
            out.push_str(&format!("- {}\n", recommendation));
        }
        out.push('\n');

        out.push_str("ASSESSMENT\n");
        out.push_str(&format!("{}\n", "=".repeat(RULE_WIDTH)));
        out.push_str(&format!("{}\n", self.assessment.describe()));
        out
    }
}

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("{}\n{}\n", title, "-".repeat(SUBRULE_WIDTH)));
}

/// Hints for the weekly report; never empty
pub fn weekly_recommendations(
    runs: &BackupRunStats,
    performance: &PerformanceMetrics,
    system: &BTreeMap<Category, usize>,
) -> Vec<String> {
    let count = |category: Category| system.get(&category).copied().unwrap_or(0);
    let mut recommendations = Vec::new();

    if let Some(failure_rate) = runs.failure_rate() {
        if failure_rate > FAILURE_RATE_THRESHOLD {
            recommendations.push(format!(
                "High backup failure rate ({:.1}%) - check the backup configuration",
                failure_rate
            ));
        }
    }
    if count(Category::Critical) > 0 {
        recommendations
            .push("Critical system events found - immediate review required".to_string());
    }
    if count(Category::Security) > 5 {
        recommendations.push("Multiple security events - review security policies".to_string());
    }
    if count(Category::Disk) > 0 {
        recommendations.push("Disk space warnings - cleanup recommended".to_string());
    }
    if performance
        .average_duration_minutes
        .is_some_and(|minutes| minutes > LONG_BACKUP_MINUTES)
    {
        recommendations.push("Long backup durations - review the backup strategy".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("No action required - system is stable".to_string());
    }
    recommendations
}
