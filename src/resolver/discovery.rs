//! Glob-style discovery of log files under a root directory
//!
//! Only the file name is matched against the pattern (`*` and `?` wildcards).
//! Results are ordered most recently modified first.

use crate::error::DiscoveryError;
use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Shell-style file name pattern such as `backup_*.log`
#[derive(Debug, Clone)]
pub struct FilePattern {
    raw: String,
    regex: Regex,
}

impl FilePattern {
    /// Compile a pattern supporting `*` (any run) and `?` (any single character)
    pub fn new(pattern: &str) -> Result<Self, DiscoveryError> {
        if pattern.is_empty() || pattern.contains('/') {
            return Err(DiscoveryError::InvalidPattern(pattern.to_string()));
        }

        let mut expr = String::with_capacity(pattern.len() * 2 + 2);
        expr.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => expr.push_str(".*"),
                '?' => expr.push('.'),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');

        let regex =
            Regex::new(&expr).map_err(|_| DiscoveryError::InvalidPattern(pattern.to_string()))?;
        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Compile several patterns at once
    pub fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Self>, DiscoveryError> {
        patterns.iter().map(|p| Self::new(p.as_ref())).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.regex.is_match(file_name)
    }
}

/// Outcome of a discovery pass
///
/// An enumeration failure never aborts the run: `files` is then empty and the
/// failure is handed to the caller, which decides how bad an empty scan is.
#[derive(Debug, Default)]
pub struct Discovered {
    pub files: Vec<PathBuf>,
    pub failure: Option<DiscoveryError>,
}

impl Discovered {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Keep only the `max_count` most recent files
    pub fn truncate(mut self, max_count: usize) -> Self {
        self.files.truncate(max_count);
        self
    }
}

/// Find regular files in `root` whose name matches any pattern
///
/// Files are de-duplicated and sorted by modification time descending, ties
/// broken by path. A missing root yields an empty list without failure.
pub fn discover(root: &Path, patterns: &[FilePattern]) -> Discovered {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Discovery root {} does not exist", root.display());
            return Discovered::default();
        }
        Err(e) => {
            warn!("Failed to enumerate {}: {}", root.display(), e);
            return Discovered {
                files: Vec::new(),
                failure: Some(DiscoveryError::Enumerate {
                    path: root.to_path_buf(),
                    source: e,
                }),
            };
        }
    };

    let mut seen = BTreeSet::new();
    let mut candidates: Vec<(PathBuf, SystemTime)> = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            debug!("Skipping non UTF-8 file name in {}", root.display());
            continue;
        };
        if !patterns.iter().any(|pattern| pattern.matches(name)) {
            continue;
        }

        let path = entry.path();
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        if seen.insert(path.clone()) {
            candidates.push((path, modified));
        }
    }

    candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    debug!(
        "Discovered {} file(s) in {} matching {:?}",
        candidates.len(),
        root.display(),
        patterns.iter().map(FilePattern::as_str).collect::<Vec<_>>()
    );

    Discovered {
        files: candidates.into_iter().map(|(path, _)| path).collect(),
        failure: None,
    }
}

/// Discover matching files and keep only the `max_count` most recent ones
pub fn discover_recent(root: &Path, patterns: &[FilePattern], max_count: usize) -> Discovered {
    discover(root, patterns).truncate(max_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
        path
    }

    #[test]
    fn test_pattern_matching() {
        let pattern = FilePattern::new("backup_*.log").unwrap();
        assert!(pattern.matches("backup_2024-06-10.log"));
        assert!(pattern.matches("backup_.log"));
        assert!(!pattern.matches("backup_1.log.gz"));
        assert!(!pattern.matches("xbackup_1.log"));

        let single = FilePattern::new("kern.log?").unwrap();
        assert!(single.matches("kern.log1"));
        assert!(!single.matches("kern.log"));
        assert!(!single.matches("kernXlog1"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(FilePattern::new("").is_err());
        assert!(FilePattern::new("logs/*.log").is_err());
    }

    #[test]
    fn test_sorted_newest_first_and_truncated() {
        let dir = TempDir::new().unwrap();
        let old = touch(dir.path(), "backup_old.log", 3600 * 48);
        let mid = touch(dir.path(), "backup_mid.log", 3600 * 24);
        let new = touch(dir.path(), "backup_new.log", 60);
        touch(dir.path(), "other.txt", 10);

        let patterns = FilePattern::compile_all(&["backup_*.log"]).unwrap();
        let all = discover(dir.path(), &patterns);
        assert!(all.failure.is_none());
        assert_eq!(all.files, vec![new.clone(), mid.clone(), old]);

        let recent = discover_recent(dir.path(), &patterns, 2);
        assert_eq!(recent.files, vec![new, mid]);
    }

    #[test]
    fn test_multiple_patterns_deduplicate() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "syslog", 10);
        touch(dir.path(), "syslog.1", 20);
        touch(dir.path(), "auth.log", 30);

        let patterns = FilePattern::compile_all(&["syslog*", "sys*", "auth.log*"]).unwrap();
        let found = discover(dir.path(), &patterns);
        assert_eq!(found.files.len(), 3);
    }

    #[test]
    fn test_missing_root_is_empty_without_failure() {
        let patterns = FilePattern::compile_all(&["*.log"]).unwrap();
        let found = discover(Path::new("/nonexistent/backwatch/root"), &patterns);
        assert!(found.is_empty());
        assert!(found.failure.is_none());
    }

    #[test]
    fn test_root_that_is_a_file_reports_failure() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "plain.log", 0);

        let patterns = FilePattern::compile_all(&["*.log"]).unwrap();
        let found = discover(&file, &patterns);
        assert!(found.is_empty());
        assert!(matches!(
            found.failure,
            Some(DiscoveryError::Enumerate { .. })
        ));
    }

    #[test]
    fn test_directories_are_not_files() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("backup_dir.log")).unwrap();

        let patterns = FilePattern::compile_all(&["backup_*.log"]).unwrap();
        assert!(discover(dir.path(), &patterns).is_empty());
    }
}
