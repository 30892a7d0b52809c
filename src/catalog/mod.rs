/// Pattern rules and catalogs
pub mod patterns;

/// Built-in catalogs for backup and system logs
pub mod builtin;

pub use builtin::{backup_catalog, system_catalog, weekly_system_catalog};
pub use patterns::{CategoryRules, PatternCatalog, PatternRule};
