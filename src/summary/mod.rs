/// Weekly roll-up statistics and assessment
pub mod weekly_summary;

pub use weekly_summary::{
    classify_run_line, weekly_recommendations, Assessment, BackupRunStats, PerformanceMetrics,
    RunLine, WeeklySummary,
};
