use crate::error::ConfigError;
use crate::report::DisplayCaps;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_SERVER_NAME: &str = "BACKUP_CHECK_SERVER_NAME";
const ENV_DAYS: &str = "BACKUP_CHECK_DAYS";
const ENV_START_DAY_OFFSET: &str = "BACKUP_CHECK_START_DAY_OFFSET";

/// Longest look-back any flow accepts, in days
pub const MAX_LOOKBACK_DAYS: u32 = 3650;
/// Longest look-back any flow accepts, in hours
pub const MAX_LOOKBACK_HOURS: u32 = MAX_LOOKBACK_DAYS * 24;

/// Top-level configuration, one section per flow
///
/// Every section falls back to its defaults when omitted from the file, so an
/// empty TOML document is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub backup_check: BackupCheckConfig,
    pub backup_monitor: BackupMonitorConfig,
    pub system_monitor: SystemMonitorConfig,
    pub weekly: WeeklyConfig,
    /// Per-unit display caps for example findings
    pub report: DisplayCaps,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Host name shown in subjects and report headers
    pub server_name: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            server_name: "backup-server".to_string(),
        }
    }
}

/// Date-partitioned required-file check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackupCheckConfig {
    /// Root holding one `YYYY-MM-DD` directory per day
    pub log_directory: PathBuf,
    pub required_files: Vec<String>,
    /// One file name per line; replaces `required_files` when the file exists
    pub logfilelist_path: Option<PathBuf>,
    pub keywords: Vec<String>,
    /// One keyword per line; replaces `keywords` when the file exists
    pub keywords_path: Option<PathBuf>,
    pub days_to_check: u32,
    pub start_day_offset: u32,
    /// Where the activity and error/warning logs are written
    pub output_directory: PathBuf,
    pub subject_prefix: String,
}

impl Default for BackupCheckConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("/var/lib/backwatch/logs"),
            required_files: ["Administration.log", "Nevaris.log", "Share_MSSQL.log"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            logfilelist_path: None,
            keywords: [
                "denied", "Denied", "Warn", "warn", "Warning", "fail", "Fail", "error", "Error",
                "ERROR", "critical", "Critical", "CRITICAL",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            keywords_path: None,
            days_to_check: 1,
            start_day_offset: 0,
            output_directory: PathBuf::from("/var/lib/backwatch/logcheck"),
            subject_prefix: "Backup-Check".to_string(),
        }
    }
}

impl BackupCheckConfig {
    /// Required file names, taken from the list file when it exists
    pub fn resolve_required_files(&self) -> Result<Vec<String>, ConfigError> {
        resolve_list(self.logfilelist_path.as_deref(), &self.required_files, "required files")
    }

    /// Keywords, taken from the list file when it exists
    pub fn resolve_keywords(&self) -> Result<Vec<String>, ConfigError> {
        resolve_list(self.keywords_path.as_deref(), &self.keywords, "keywords")
    }
}

/// Backup job log monitoring
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackupMonitorConfig {
    pub log_directory: PathBuf,
    pub pattern: String,
    /// Only the most recent files are analyzed
    pub max_files: usize,
    /// Logs older than this are reported as outdated
    pub max_age_hours: u32,
}

impl Default for BackupMonitorConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("/var/lib/backwatch/backup"),
            pattern: "backup_*.log".to_string(),
            max_files: 10,
            max_age_hours: 25,
        }
    }
}

/// System log sweep
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemMonitorConfig {
    pub log_directory: PathBuf,
    pub patterns: Vec<String>,
    pub max_files: usize,
    /// Default look-back window; the CLI can override it
    pub hours_back: u32,
}

impl Default for SystemMonitorConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("/var/log"),
            patterns: ["syslog*", "messages*", "kern.log*", "auth.log*"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_files: 5,
            hours_back: 1,
        }
    }
}

/// Weekly roll-up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeeklyConfig {
    /// Application logs whose backup lines are counted as runs
    pub app_log_directory: PathBuf,
    pub backup_directory: PathBuf,
    pub system_directory: PathBuf,
    pub period_days: u32,
    pub output_directory: PathBuf,
}

impl Default for WeeklyConfig {
    fn default() -> Self {
        Self {
            app_log_directory: PathBuf::from("/var/log/backwatch"),
            backup_directory: PathBuf::from("/var/lib/backwatch/backup"),
            system_directory: PathBuf::from("/var/log"),
            period_days: 7,
            output_directory: PathBuf::from("/var/log/backwatch"),
        }
    }
}

/// Notification delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct NotifyConfig {
    /// When set, each notification is written as a file into this directory;
    /// otherwise notifications only go to the log
    pub outbox_directory: Option<PathBuf>,
}

impl Config {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// `ConfigError::ReadError` when the file cannot be read, `TomlError` when
    /// it is malformed and `ValidationError` when a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, falling back to defaults when it is missing
    ///
    /// A file that exists but is malformed or invalid is still an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => {
                info!("Loading configuration from: {}", path.display());
                Self::from_file(path)
            }
            Some(path) => {
                warn!(
                    "Configuration file '{}' not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                info!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply `BACKUP_CHECK_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, then re-validate
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(server_name) = lookup(ENV_SERVER_NAME).filter(|v| !v.trim().is_empty()) {
            debug!("{} overrides server name", ENV_SERVER_NAME);
            self.general.server_name = server_name.trim().to_string();
        }
        if let Some(days) = lookup(ENV_DAYS) {
            self.backup_check.days_to_check = parse_override(ENV_DAYS, &days)?;
        }
        if let Some(offset) = lookup(ENV_START_DAY_OFFSET) {
            self.backup_check.start_day_offset = parse_override(ENV_START_DAY_OFFSET, &offset)?;
        }
        self.validate()
    }

    /// Reject values that would make a flow meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backup_check.days_to_check == 0 {
            return Err(ConfigError::ValidationError(
                "backup_check.days_to_check must be greater than 0".to_string(),
            ));
        }
        if self.backup_monitor.max_files == 0 {
            return Err(ConfigError::ValidationError(
                "backup_monitor.max_files must be greater than 0".to_string(),
            ));
        }
        if self.backup_monitor.max_age_hours == 0 {
            return Err(ConfigError::ValidationError(
                "backup_monitor.max_age_hours must be greater than 0".to_string(),
            ));
        }
        if self.system_monitor.max_files == 0 {
            return Err(ConfigError::ValidationError(
                "system_monitor.max_files must be greater than 0".to_string(),
            ));
        }
        if self.weekly.period_days == 0 {
            return Err(ConfigError::ValidationError(
                "weekly.period_days must be greater than 0".to_string(),
            ));
        }

        let check_span =
            u64::from(self.backup_check.start_day_offset) + u64::from(self.backup_check.days_to_check);
        check_limit("backup_check.start_day_offset + days_to_check", check_span, MAX_LOOKBACK_DAYS)?;
        check_limit(
            "backup_monitor.max_age_hours",
            u64::from(self.backup_monitor.max_age_hours),
            MAX_LOOKBACK_HOURS,
        )?;
        check_limit(
            "system_monitor.hours_back",
            u64::from(self.system_monitor.hours_back),
            MAX_LOOKBACK_HOURS,
        )?;
        check_limit(
            "weekly.period_days",
            u64::from(self.weekly.period_days),
            MAX_LOOKBACK_DAYS,
        )?;
        Ok(())
    }
}

fn check_limit(name: &str, value: u64, max: u32) -> Result<(), ConfigError> {
    if value > u64::from(max) {
        return Err(ConfigError::ValidationError(format!(
            "{} must be at most {}, got {}",
            name, max, value
        )));
    }
    Ok(())
}

fn parse_override(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|e| {
        ConfigError::ParseError(format!("{}='{}' is not a valid number: {}", key, value, e))
    })
}

fn resolve_list(
    list_file: Option<&Path>,
    inline: &[String],
    what: &str,
) -> Result<Vec<String>, ConfigError> {
    match list_file {
        Some(path) if path.exists() => {
            let entries = read_list_file(path)?;
            info!("Loaded {} {} from {}", entries.len(), what, path.display());
            Ok(entries)
        }
        Some(path) => {
            warn!(
                "List file {} not found, using configured {}",
                path.display(),
                what
            );
            Ok(inline.to_vec())
        }
        None => Ok(inline.to_vec()),
    }
}

/// Read a list file: one entry per non-blank line, surrounding whitespace removed
pub fn read_list_file(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
