/// Typed configuration loaded from TOML
pub mod settings;

pub use settings::{
    read_list_file, BackupCheckConfig, BackupMonitorConfig, Config, GeneralConfig, NotifyConfig,
    SystemMonitorConfig, WeeklyConfig, MAX_LOOKBACK_DAYS, MAX_LOOKBACK_HOURS,
};
