//! Core finding types for the log classification engine
//!
//! This module defines the data structures shared by every stage of a run:
//! categories a line can be classified into, the findings recorded per line,
//! the per-unit analysis record and the overall severity scale.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Timestamp type for consistent time handling across the engine
pub type Timestamp = DateTime<Local>;

/// Topic or severity tag a log line (or a whole unit) can be classified into
///
/// Categories are independent: a single line may belong to several of them.
/// Declaration order is the display order used by the renderer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Completion marker of a backup run
    Success,
    /// Critical system event (panic, crash, fatal error)
    Critical,
    /// Generic error line
    Error,
    /// Generic warning line
    Warning,
    /// Authentication or intrusion related event
    Security,
    /// Disk space exhaustion
    Disk,
    /// Memory exhaustion
    Memory,
    /// Network reachability problem
    Network,
    /// Required file is absent
    MissingFile,
    /// Required date directory is absent
    MissingDirectory,
    /// Required file exists but has zero bytes
    EmptyFile,
    /// File could not be read to the end
    ReadError,
}

impl Category {
    /// Every category in display order
    pub const ALL: [Category; 12] = [
        Category::Success,
        Category::Critical,
        Category::Error,
        Category::Warning,
        Category::Security,
        Category::Disk,
        Category::Memory,
        Category::Network,
        Category::MissingFile,
        Category::MissingDirectory,
        Category::EmptyFile,
        Category::ReadError,
    ];

    /// Human-readable label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Category::Success => "Success indicators",
            Category::Critical => "Critical events",
            Category::Error => "Errors",
            Category::Warning => "Warnings",
            Category::Security => "Security events",
            Category::Disk => "Disk space warnings",
            Category::Memory => "Memory issues",
            Category::Network => "Network issues",
            Category::MissingFile => "Missing files",
            Category::MissingDirectory => "Missing directories",
            Category::EmptyFile => "Empty files",
            Category::ReadError => "Read errors",
        }
    }

    /// Whether a finding in this category is bad news
    pub fn is_adverse(&self) -> bool {
        !matches!(self, Category::Success)
    }

    /// Categories recorded for a unit as a whole rather than for a line
    pub fn is_unit_level(&self) -> bool {
        matches!(
            self,
            Category::MissingFile
                | Category::MissingDirectory
                | Category::EmptyFile
                | Category::ReadError
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Success => "success",
            Category::Critical => "critical",
            Category::Error => "error",
            Category::Warning => "warning",
            Category::Security => "security",
            Category::Disk => "disk",
            Category::Memory => "memory",
            Category::Network => "network",
            Category::MissingFile => "missing_file",
            Category::MissingDirectory => "missing_directory",
            Category::EmptyFile => "empty_file",
            Category::ReadError => "read_error",
        };
        f.write_str(name)
    }
}

/// Location of a finding inside its unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineRef {
    /// 1-based physical line number
    Line(usize),
    /// Finding concerns the unit as a whole
    NotApplicable,
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRef::Line(n) => write!(f, "{}", n),
            LineRef::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// One recorded classification event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    /// Identifier of the unit the finding belongs to
    pub source: String,
    /// Where in the unit the finding was made
    pub line: LineRef,
    /// Category the line was classified into
    pub category: Category,
    /// Raw (trimmed) line text, or a description for unit-level findings
    pub text: String,
    /// Substring matched by the winning rule, if any
    pub matched: Option<String>,
}

impl Finding {
    /// Create a finding for a classified line
    pub fn for_line(
        source: impl Into<String>,
        line_number: usize,
        category: Category,
        text: impl Into<String>,
        matched: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            line: LineRef::Line(line_number),
            category,
            text: text.into(),
            matched: Some(matched.into()),
        }
    }

    /// Create a finding that concerns the whole unit
    pub fn for_unit(source: impl Into<String>, category: Category, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            line: LineRef::NotApplicable,
            category,
            text: text.into(),
            matched: None,
        }
    }
}

/// Result of a freshness check on a single file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Modified less than the maximum age ago
    Fresh,
    /// Older than the maximum age
    Stale { age: Duration },
    /// File metadata could not be read
    Unreadable,
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// Classification result for one examined unit (file or date directory)
///
/// Findings can only be appended. Numeric fields keep the first value
/// recorded; later values for the same unit are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    source: String,
    path: PathBuf,
    size_bytes: u64,
    modified: Option<Timestamp>,
    findings: Vec<Finding>,
    duration_minutes: Option<f64>,
    transferred_mb: Option<f64>,
    freshness: Option<Freshness>,
    lines_scanned: usize,
}

impl Analysis {
    /// Start an empty analysis for the given unit
    pub fn new(source: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
            size_bytes: 0,
            modified: None,
            findings: Vec::new(),
            duration_minutes: None,
            transferred_mb: None,
            freshness: None,
            lines_scanned: 0,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn modified(&self) -> Option<Timestamp> {
        self.modified
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn duration_minutes(&self) -> Option<f64> {
        self.duration_minutes
    }

    pub fn transferred_mb(&self) -> Option<f64> {
        self.transferred_mb
    }

    pub fn freshness(&self) -> Option<Freshness> {
        self.freshness
    }

    pub fn lines_scanned(&self) -> usize {
        self.lines_scanned
    }

    /// True iff at least one success finding was recorded
    pub fn completed(&self) -> bool {
        self.count(Category::Success) > 0
    }

    /// Number of findings in the given category
    pub fn count(&self, category: Category) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.category == category)
            .count()
    }

    /// Findings of one category in recording order
    pub fn findings_in(&self, category: Category) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(move |finding| finding.category == category)
    }

    /// Whether any finding in an adverse category was recorded
    pub fn has_adverse_findings(&self) -> bool {
        self.findings.iter().any(|f| f.category.is_adverse())
    }

    pub(crate) fn set_metadata(&mut self, size_bytes: u64, modified: Option<Timestamp>) {
        self.size_bytes = size_bytes;
        self.modified = modified;
    }

    pub(crate) fn push(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub(crate) fn record_duration(&mut self, minutes: f64) {
        if self.duration_minutes.is_none() {
            self.duration_minutes = Some(minutes);
        }
    }

    pub(crate) fn record_transferred(&mut self, megabytes: f64) {
        if self.transferred_mb.is_none() {
            self.transferred_mb = Some(megabytes);
        }
    }

    pub(crate) fn count_line(&mut self) {
        self.lines_scanned += 1;
    }

    /// Attach the result of a freshness check
    pub fn set_freshness(&mut self, freshness: Freshness) {
        self.freshness = Some(freshness);
    }
}

/// Overall severity of a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Nothing to report
    Ok,
    /// Informational only
    Info,
    /// Something may need attention
    Warning,
    /// Something failed
    Error,
    /// Immediate attention required
    Critical,
}

impl Severity {
    /// Upper-case status word used in subjects and status lines
    pub fn status_word(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status_word())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Ok < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_severity_serialization() {
        assert_eq!(serde_json::to_string(&Severity::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn test_category_serialization_matches_display() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category));
        }
    }

    #[test]
    fn test_line_ref_display() {
        assert_eq!(LineRef::Line(12).to_string(), "12");
        assert_eq!(LineRef::NotApplicable.to_string(), "N/A");
    }

    #[test]
    fn test_completed_is_derived_from_success_findings() {
        let mut analysis = Analysis::new("backup_1.log", "/tmp/backup_1.log");
        assert!(!analysis.completed());

        analysis.push(Finding::for_line(
            "backup_1.log",
            1,
            Category::Error,
            "error: disk",
            "error: disk",
        ));
        assert!(!analysis.completed());

        analysis.push(Finding::for_line(
            "backup_1.log",
            2,
            Category::Success,
            "Backup completed",
            "Backup completed",
        ));
        assert!(analysis.completed());
    }

    #[test]
    fn test_numeric_fields_keep_first_value() {
        let mut analysis = Analysis::new("a", "a");
        analysis.record_duration(90.0);
        analysis.record_duration(5.0);
        analysis.record_transferred(2560.0);
        analysis.record_transferred(1.0);

        assert_eq!(analysis.duration_minutes(), Some(90.0));
        assert_eq!(analysis.transferred_mb(), Some(2560.0));
    }

    #[test]
    fn test_unit_level_categories() {
        assert!(Category::MissingFile.is_unit_level());
        assert!(Category::ReadError.is_unit_level());
        assert!(!Category::Error.is_unit_level());
        assert!(!Category::Success.is_adverse());
        assert!(Category::Network.is_adverse());
    }
}
