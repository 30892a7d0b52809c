use anyhow::{Context, Result};
use backwatch::alerts::{LogNotifier, Notifier, OutboxNotifier};
use backwatch::aggregator::Report;
use backwatch::config::{Config, MAX_LOOKBACK_HOURS};
use backwatch::monitors::{
    BackupFileCheck, BackupLogMonitor, Delivery, RunOutcome, SystemLogMonitor, WeeklyReporter,
};
use backwatch::Severity;
use chrono::Local;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::PathBuf;

/// Command-line arguments for the backup and system log watcher
#[derive(Parser)]
#[command(
    name = "backwatch",
    about = "Backup and system log classification and reporting",
    long_about = "Scans backup job logs, date-partitioned backup check logs and syslog-style \
                  files, classifies their lines into categories, aggregates the findings into \
                  a report with an overall severity and hands the report to a notifier."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        global = true,
        help = "Enable verbose logging output (debug level)"
    )]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Check the required logs of each date directory in the configured window
    CheckFiles,
    /// Analyze the most recent backup job logs
    Backup,
    /// Sweep system logs for recent events
    System {
        /// Look-back window in hours (defaults to the configured value)
        #[arg(long, value_name = "N")]
        hours: Option<u32>,
    },
    /// Build the weekly roll-up report
    Weekly,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// A missing configuration file is not an error; loading falls back to
    /// defaults with a warning.
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        if let Command::System { hours: Some(hours) } = self.command {
            if hours == 0 {
                return Err("--hours must be greater than 0".to_string());
            }
            if hours > MAX_LOOKBACK_HOURS {
                return Err(format!("--hours must be at most {}", MAX_LOOKBACK_HOURS));
            }
        }

        Ok(())
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = Config::load_or_default(path.map(PathBuf::as_path))
        .context("Failed to load configuration")?;
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    Ok(config)
}

fn build_notifier(config: &Config) -> Box<dyn Notifier> {
    match &config.notify.outbox_directory {
        Some(directory) => {
            info!("Notifications go to outbox {}", directory.display());
            Box::new(OutboxNotifier::new(directory))
        }
        None => Box::new(LogNotifier),
    }
}

fn summarize<R>(outcome: &RunOutcome<R>) {
    info!("{:?} finished with status {}", outcome.scope, outcome.severity);
    for artifact in &outcome.artifacts {
        info!("Artifact: {}", artifact.display());
    }
    match &outcome.delivery {
        Delivery::Sent => info!("Notification delivered"),
        Delivery::Skipped => info!("No notification required"),
        Delivery::Failed(reason) => warn!("Notification failed: {}", reason),
    }
    if outcome.severity >= Severity::Error {
        warn!("Run reported {}", outcome.severity);
    }
}

/// A backup run that found no job logs at all is a failed run
fn require_backup_logs(outcome: &RunOutcome<Report>) -> Result<()> {
    if outcome.summary.discovered == Some(0) {
        anyhow::bail!("No backup logs found");
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let notifier = build_notifier(&config);
    let now = Local::now();
    let server_name = config.general.server_name.clone();

    match &cli.command {
        Command::CheckFiles => {
            let outcome = BackupFileCheck::new(
                config.backup_check.clone(),
                server_name,
                config.report.clone(),
            )
            .run(now, notifier.as_ref())
            .context("Backup file check failed")?;
            summarize(&outcome);
        }
        Command::Backup => {
            let outcome = BackupLogMonitor::new(
                config.backup_monitor.clone(),
                server_name,
                config.report.clone(),
            )
            .run(now, notifier.as_ref())
            .context("Backup monitoring failed")?;
            summarize(&outcome);
            require_backup_logs(&outcome)?;
        }
        Command::System { hours } => {
            let outcome = SystemLogMonitor::new(
                config.system_monitor.clone(),
                server_name,
                config.report.clone(),
            )
            .run(now, *hours, notifier.as_ref())
            .context("System monitoring failed")?;
            summarize(&outcome);
        }
        Command::Weekly => {
            let outcome = WeeklyReporter::new(config.weekly.clone(), server_name)
                .run(now, notifier.as_ref())
                .context("Weekly report failed")?;
            summarize(&outcome);
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["backwatch", "system", "--hours", "6"]).unwrap();
        assert_eq!(cli.command, Command::System { hours: Some(6) });

        let cli =
            Cli::try_parse_from(["backwatch", "--verbose", "check-files", "-c", "a.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.command, Command::CheckFiles);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));

        assert!(Cli::try_parse_from(["backwatch"]).is_err());
        assert!(Cli::try_parse_from(["backwatch", "restore"]).is_err());
    }

    #[test]
    fn test_cli_validation_with_existing_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let cli = Cli {
            config: Some(temp_file.path().to_path_buf()),
            verbose: false,
            command: Command::Backup,
        };
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_validation_with_missing_file() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/config.toml")),
            verbose: false,
            command: Command::Weekly,
        };
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_validation_with_directory() {
        let dir = TempDir::new().unwrap();
        let cli = Cli {
            config: Some(dir.path().to_path_buf()),
            verbose: false,
            command: Command::Backup,
        };
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_validation_rejects_zero_hours() {
        let cli = Cli {
            config: None,
            verbose: false,
            command: Command::System { hours: Some(0) },
        };
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_validation_rejects_oversized_hours() {
        let mut cli = Cli {
            config: None,
            verbose: false,
            command: Command::System {
                hours: Some(MAX_LOOKBACK_HOURS + 1),
            },
        };
        assert!(cli.validate().is_err());

        cli.command = Command::System {
            hours: Some(MAX_LOOKBACK_HOURS),
        };
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_backup_run_without_logs_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.backup_monitor.log_directory = dir.path().to_path_buf();
        let monitor = BackupLogMonitor::new(
            config.backup_monitor.clone(),
            "nas01",
            config.report.clone(),
        );

        let outcome = monitor.run(Local::now(), &LogNotifier).unwrap();
        assert_eq!(outcome.severity, Severity::Critical);
        assert!(require_backup_logs(&outcome).is_err());

        std::fs::write(dir.path().join("backup_1.log"), "Backup completed\n").unwrap();
        let outcome = monitor.run(Local::now(), &LogNotifier).unwrap();
        assert!(require_backup_logs(&outcome).is_ok());
    }

    #[test]
    fn test_outbox_notifier_selected_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.notify.outbox_directory = Some(dir.path().join("outbox"));

        let notifier = build_notifier(&config);
        notifier
            .notify("subject", "body", backwatch::alerts::NotificationTag::Info, &[])
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path().join("outbox")).unwrap().count(), 1);
    }
}
