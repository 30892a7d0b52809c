//! Report aggregation and severity resolution
//!
//! This module merges fully built `Analysis` records into one `Report`,
//! computes exact per-category totals and resolves a single overall severity
//! with escalation bias: every rule can only raise the severity.

use crate::findings::{Analysis, Category, Severity, Timestamp};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which flow a report was produced by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Date-partitioned directories with a required file list
    BackupFiles,
    /// Glob-discovered backup job logs
    BackupLogs,
    /// Glob-discovered syslog-style files
    SystemLogs,
    /// Seven-day roll-up
    Weekly,
}

impl Scope {
    pub fn title(&self) -> &'static str {
        match self {
            Scope::BackupFiles => "BACKUP FILE CHECK",
            Scope::BackupLogs => "BACKUP MONITORING REPORT",
            Scope::SystemLogs => "SYSTEM MONITORING REPORT",
            Scope::Weekly => "WEEKLY MONITORING REPORT",
        }
    }
}

/// Flow-specific knobs of the severity resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityPolicy {
    /// Missing required files/directories are critical rather than errors
    pub missing_units_critical: bool,
    /// Severity when discovery found nothing; `None` when units are not discovered
    pub empty_discovery: Option<Severity>,
    /// Security, disk and memory findings count as errors rather than warnings
    pub resource_findings_are_errors: bool,
    /// Every unit must carry a completion marker
    pub require_completion: bool,
}

impl SeverityPolicy {
    /// Default policy for a flow
    pub fn for_scope(scope: Scope) -> Self {
        match scope {
            Scope::BackupFiles => Self {
                missing_units_critical: true,
                empty_discovery: None,
                resource_findings_are_errors: false,
                require_completion: false,
            },
            Scope::BackupLogs => Self {
                missing_units_critical: false,
                empty_discovery: Some(Severity::Critical),
                resource_findings_are_errors: false,
                require_completion: true,
            },
            Scope::SystemLogs => Self {
                missing_units_critical: false,
                empty_discovery: Some(Severity::Info),
                resource_findings_are_errors: true,
                require_completion: false,
            },
            Scope::Weekly => Self {
                missing_units_critical: false,
                empty_discovery: None,
                resource_findings_are_errors: false,
                require_completion: false,
            },
        }
    }
}

/// Time span a report covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Aggregate of one run
#[derive(Debug, Clone)]
pub struct Report {
    pub scope: Scope,
    pub generated_at: Timestamp,
    pub period: Period,
    /// Exact finding counts per category; every category is present
    pub totals: BTreeMap<Category, usize>,
    /// Analyses in the order they were examined
    pub analyses: Vec<Analysis>,
    /// Dates examined by date-directory flows
    pub checked_dates: Vec<String>,
    /// Number of units discovered, for discovery-based flows
    pub discovered: Option<usize>,
    /// Recoverable discovery failure, rendered as a note
    pub discovery_failure: Option<String>,
    pub overall_severity: Severity,
    pub recommendations: Vec<String>,
}

impl Report {
    /// Total findings of one category across all analyses
    pub fn total(&self, category: Category) -> usize {
        self.totals.get(&category).copied().unwrap_or(0)
    }

    /// Total number of adverse findings
    pub fn adverse_total(&self) -> usize {
        self.totals
            .iter()
            .filter(|(category, _)| category.is_adverse())
            .map(|(_, count)| count)
            .sum()
    }

    /// Number of analyses with a completion marker
    pub fn completed_count(&self) -> usize {
        self.analyses.iter().filter(|a| a.completed()).count()
    }

    /// Number of analyses that failed their freshness check
    pub fn stale_count(&self) -> usize {
        self.analyses
            .iter()
            .filter(|a| a.freshness().is_some_and(|f| !f.is_fresh()))
            .count()
    }
}

/// Merges analyses into a report and resolves the overall severity
#[derive(Debug, Clone)]
pub struct Aggregator {
    scope: Scope,
    policy: SeverityPolicy,
    generated_at: Timestamp,
    period: Period,
    checked_dates: Vec<String>,
    discovered: Option<usize>,
    discovery_failure: Option<String>,
}

impl Aggregator {
    /// Create an aggregator with the default policy for `scope`
    pub fn new(scope: Scope, generated_at: Timestamp, period: Period) -> Self {
        Self {
            scope,
            policy: SeverityPolicy::for_scope(scope),
            generated_at,
            period,
            checked_dates: Vec::new(),
            discovered: None,
            discovery_failure: None,
        }
    }

    /// Override the severity policy
    pub fn with_policy(mut self, policy: SeverityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Record how many units discovery produced, and why it failed if it did
    pub fn with_discovery(mut self, discovered: usize, failure: Option<String>) -> Self {
        self.discovered = Some(discovered);
        self.discovery_failure = failure;
        self
    }

    /// Record the dates examined by a date-directory flow
    pub fn with_checked_dates(mut self, dates: Vec<String>) -> Self {
        self.checked_dates = dates;
        self
    }

    /// Merge analyses into a report
    ///
    /// Pure: aggregating the same analyses twice yields identical totals,
    /// severity and recommendations.
    pub fn aggregate(&self, analyses: Vec<Analysis>) -> Report {
        let totals = count_totals(&analyses);
        let overall_severity = resolve_severity(&self.policy, &totals, &analyses, self.discovered);
        let recommendations = recommend(&self.policy, &totals, &analyses, self.discovered);

        debug!("Totals for {:?}: {:?}", self.scope, totals);
        info!(
            "Aggregated {} unit(s) for {:?}: severity {}",
            analyses.len(),
            self.scope,
            overall_severity
        );

        Report {
            scope: self.scope,
            generated_at: self.generated_at,
            period: self.period,
            totals,
            analyses,
            checked_dates: self.checked_dates.clone(),
            discovered: self.discovered,
            discovery_failure: self.discovery_failure.clone(),
            overall_severity,
            recommendations,
        }
    }
}

/// Exact finding counts per category, every category present
pub fn count_totals(analyses: &[Analysis]) -> BTreeMap<Category, usize> {
    let mut totals: BTreeMap<Category, usize> =
        Category::ALL.iter().map(|category| (*category, 0)).collect();
    for analysis in analyses {
        for finding in analysis.findings() {
            *totals.entry(finding.category).or_insert(0) += 1;
        }
    }
    totals
}

/// Resolve the overall severity; the highest triggered level wins
pub fn resolve_severity(
    policy: &SeverityPolicy,
    totals: &BTreeMap<Category, usize>,
    analyses: &[Analysis],
    discovered: Option<usize>,
) -> Severity {
    let count = |category: Category| totals.get(&category).copied().unwrap_or(0);
    let mut severity = Severity::Ok;
    let mut raise = |level: Severity| severity = severity.max(level);

    if count(Category::Critical) > 0 {
        raise(Severity::Critical);
    }

    if count(Category::MissingFile) + count(Category::MissingDirectory) > 0 {
        raise(if policy.missing_units_critical {
            Severity::Critical
        } else {
            Severity::Error
        });
    }

    if let (Some(0), Some(level)) = (discovered, policy.empty_discovery) {
        raise(level);
    }

    if count(Category::Error) + count(Category::ReadError) + count(Category::EmptyFile) > 0 {
        raise(Severity::Error);
    }

    if count(Category::Security) + count(Category::Disk) + count(Category::Memory) > 0 {
        raise(if policy.resource_findings_are_errors {
            Severity::Error
        } else {
            Severity::Warning
        });
    }

    if policy.require_completion && analyses.iter().any(|a| !a.completed()) {
        raise(Severity::Error);
    }

    if count(Category::Warning) + count(Category::Network) > 0 {
        raise(Severity::Warning);
    }

    if analyses
        .iter()
        .any(|a| a.freshness().is_some_and(|f| !f.is_fresh()))
    {
        raise(Severity::Warning);
    }

    severity
}

/// Actionable hints derived from the totals
pub fn recommend(
    policy: &SeverityPolicy,
    totals: &BTreeMap<Category, usize>,
    analyses: &[Analysis],
    discovered: Option<usize>,
) -> Vec<String> {
    let count = |category: Category| totals.get(&category).copied().unwrap_or(0);
    let mut recommendations = Vec::new();

    if discovered == Some(0) && policy.empty_discovery.is_some() {
        recommendations.push("No log files found - verify the configured log directory".to_string());
    }
    if count(Category::Critical) > 0 {
        recommendations
            .push("Critical events found - immediate review required".to_string());
    }
    if count(Category::MissingDirectory) + count(Category::MissingFile) > 0 {
        recommendations
            .push("Required logs are missing - check that the backup jobs ran".to_string());
    }
    if count(Category::ReadError) > 0 {
        recommendations.push("Some logs could not be read - check file permissions".to_string());
    }
    if policy.require_completion {
        let incomplete = analyses.iter().filter(|a| !a.completed()).count();
        if incomplete > 0 {
            recommendations.push(format!(
                "{} backup(s) without completion marker - inspect the job logs",
                incomplete
            ));
        }
    }
    if analyses
        .iter()
        .any(|a| a.freshness().is_some_and(|f| !f.is_fresh()))
    {
        recommendations.push("Backup logs are outdated - verify the backup schedule".to_string());
    }
    if count(Category::Security) > 5 {
        recommendations.push("Multiple security events - review security policies".to_string());
    }
    if count(Category::Disk) > 0 {
        recommendations.push("Disk space warnings - cleanup recommended".to_string());
    }
    if count(Category::Memory) > 0 {
        recommendations.push("Memory exhaustion reported - check running services".to_string());
    }

    recommendations
}
