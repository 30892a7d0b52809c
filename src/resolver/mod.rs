/// Date-partitioned directory windows
pub mod date_window;

/// Glob-style file discovery
pub mod discovery;

/// File age checks
pub mod freshness;

pub use date_window::DateWindow;
pub use discovery::{discover, discover_recent, Discovered, FilePattern};
pub use freshness::{check_freshness, format_age, lookback, modified_since, modified_time};
