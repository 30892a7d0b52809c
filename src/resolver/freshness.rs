use crate::error::ConfigError;
use crate::findings::{Freshness, Timestamp};
use chrono::{DateTime, Duration, Local};
use log::warn;
use std::path::Path;

/// Modification time of a file in local time, if it can be read
pub fn modified_time(path: &Path) -> Option<Timestamp> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified))
}

/// Check whether `path` was modified less than `max_age` before `now`
///
/// Never fails: a file whose metadata cannot be read is `Unreadable`.
pub fn check_freshness(path: &Path, now: Timestamp, max_age: Duration) -> Freshness {
    let Some(modified) = modified_time(path) else {
        warn!("Cannot determine age of {}", path.display());
        return Freshness::Unreadable;
    };

    let age = now - modified;
    if age < max_age {
        Freshness::Fresh
    } else {
        warn!("Backup too old: {} (age: {})", path.display(), format_age(age));
        Freshness::Stale { age }
    }
}

/// Whether `path` was modified at or after `cutoff`
pub fn modified_since(path: &Path, cutoff: Timestamp) -> bool {
    modified_time(path).is_some_and(|modified| modified >= cutoff)
}

/// Start of a look-back window of length `span` ending at `now`
///
/// # Errors
///
/// `ConfigError::ValidationError` when the start falls outside the
/// representable date range.
pub fn lookback(now: Timestamp, span: Duration) -> Result<Timestamp, ConfigError> {
    now.checked_sub_signed(span).ok_or_else(|| {
        ConfigError::ValidationError(format!(
            "look-back window of {} day(s) before {} is out of range",
            span.num_days(),
            now.format("%Y-%m-%d")
        ))
    })
}

/// Render an age as `<days>d <hh>:<mm>:<ss>` or `<hh>:<mm>:<ss>`
pub fn format_age(age: Duration) -> String {
    let total = age.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if days > 0 {
        format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use std::fs::File;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn file_with_age(dir: &TempDir, name: &str, age: std::time::Duration) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn test_recent_file_is_fresh() {
        let dir = TempDir::new().unwrap();
        let path = file_with_age(&dir, "backup_1.log", std::time::Duration::from_secs(3600));
        assert_eq!(
            check_freshness(&path, Local::now(), Duration::hours(25)),
            Freshness::Fresh
        );
    }

    #[test]
    fn test_old_file_is_stale() {
        let dir = TempDir::new().unwrap();
        let path = file_with_age(
            &dir,
            "backup_1.log",
            std::time::Duration::from_secs(26 * 3600),
        );
        let freshness = check_freshness(&path, Local::now(), Duration::hours(25));
        assert!(matches!(freshness, Freshness::Stale { age } if age >= Duration::hours(26)));
        assert!(!freshness.is_fresh());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let freshness = check_freshness(
            Path::new("/nonexistent/backup.log"),
            Local::now(),
            Duration::hours(25),
        );
        assert_eq!(freshness, Freshness::Unreadable);
        assert!(!freshness.is_fresh());
    }

    #[test]
    fn test_modified_since() {
        let dir = TempDir::new().unwrap();
        let path = file_with_age(&dir, "a.log", std::time::Duration::from_secs(8 * 86_400));
        let week_ago = Local::now() - Duration::days(7);
        assert!(!modified_since(&path, week_ago));
        assert!(modified_since(&path, week_ago - Duration::days(2)));
        assert!(!modified_since(Path::new("/nonexistent"), week_ago));
    }

    #[test]
    fn test_lookback_within_and_beyond_range() {
        let now = Local::now();
        assert_eq!(lookback(now, Duration::hours(6)).unwrap(), now - Duration::hours(6));
        assert!(matches!(
            lookback(now, Duration::hours(i64::from(u32::MAX))),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(3725)), "01:02:05");
        assert_eq!(format_age(Duration::hours(49)), "2d 01:00:00");
        assert_eq!(format_age(Duration::seconds(-5)), "00:00:00");
    }
}
