/// Error types for the log classification engine
pub mod error;

/// Categories, findings, per-unit analyses and severities
pub mod findings;

/// Data-driven pattern tables per category
pub mod catalog;

/// Line classification and numeric field extraction
pub mod classifier;

/// Date windows, file discovery and freshness checks
pub mod resolver;

/// File and date-directory analysis
pub mod analyzer;

/// Report aggregation and severity resolution
pub mod aggregator;

/// Plain-text report rendering
pub mod report;

/// Weekly roll-up statistics
pub mod summary;

/// Notification delivery and policy
pub mod alerts;

/// Configuration management
pub mod config;

/// End-to-end monitoring flows
pub mod monitors;

// Re-export commonly used types
pub use error::{ConfigError, DiscoveryError, NotifyError, RunError};
pub use findings::{Analysis, Category, Finding, Freshness, Severity};
