/// File and date-directory analysis
pub mod file_analyzer;

/// Embedded-timestamp window filter for system logs
pub mod time_window;

pub use file_analyzer::FileAnalyzer;
pub use time_window::{LineTimestamp, TimeWindow};
