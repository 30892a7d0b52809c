/// Per-line category classification
pub mod line_classifier;

/// Duration and volume extraction
pub mod extract;

pub use extract::{parse_duration_minutes, volume_to_mb, NumericExtractor};
pub use line_classifier::{LineClassifier, LineMatch};
