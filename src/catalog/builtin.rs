//! Built-in pattern catalogs for the backup and system log flows

use super::patterns::{PatternCatalog, PatternRule};
use crate::findings::Category;

const BACKUP_ERRORS: &[&str] = &[
    r"error:?\s*(.*)",
    r"failed:?\s*(.*)",
    r"exception:?\s*(.*)",
    r"critical:?\s*(.*)",
    r"cannot\s+(.*)",
    r"permission\s+denied",
    r"no\s+space\s+left",
    r"connection\s+refused",
];

const BACKUP_WARNINGS: &[&str] = &[
    r"warning:?\s*(.*)",
    r"warn:?\s*(.*)",
    r"skipped:?\s*(.*)",
    r"timeout:?\s*(.*)",
];

const BACKUP_SUCCESS: &[&str] = &[
    r"backup\s+completed?",
    r"successfully?\s+completed?",
    r"finished\s+successfully?",
    r"done\s+successfully?",
    r"backup\s+successful",
];

const SYSTEM_CRITICAL: &[&str] = &[
    r"kernel panic",
    r"out of memory",
    r"segmentation fault",
    r"system crash",
    r"fatal error",
    r"emergency",
    r"critical.*error",
];

const SYSTEM_SECURITY: &[&str] = &[
    r"authentication failure",
    r"failed.*login",
    r"invalid.*user",
    r"sudo.*incorrect password",
    r"break.*attempt",
    r"intrusion.*detect",
    r"unauthorized.*access",
];

const SYSTEM_DISK: &[&str] = &[
    r"no space left",
    r"disk.*full",
    r"filesystem.*full",
    r"out of disk space",
    r"device.*full",
];

const SYSTEM_MEMORY: &[&str] = &[
    r"out of memory",
    r"oom.*kill",
    r"memory.*exhausted",
    r"cannot allocate memory",
    r"virtual memory.*exhausted",
];

const SYSTEM_NETWORK: &[&str] = &[
    r"network.*unreachable",
    r"connection.*refused",
    r"timeout.*connecting",
    r"dns.*resolution.*failed",
    r"network.*interface.*down",
];

const SYSTEM_GENERIC_ERROR: &str = r"error|failed|failure|exception";
const SYSTEM_GENERIC_ERROR_EXCLUDE: &str = r"info|debug|notice";
const SYSTEM_GENERIC_WARNING: &str = r"warning|warn";

const WEEKLY_CRITICAL: &[&str] = &["critical", "emergency", "panic"];
const WEEKLY_SECURITY: &[&str] = &["authentication failure", "failed login", "invalid user"];
const WEEKLY_DISK: &[&str] = &["no space left", "disk full"];
const WEEKLY_MEMORY: &[&str] = &["out of memory", "oom kill"];
const WEEKLY_NETWORK: &[&str] = &["network unreachable", "connection refused"];

/// Catalog for backup job logs: errors, warnings and completion markers
pub fn backup_catalog() -> Result<PatternCatalog, regex::Error> {
    PatternCatalog::from_table(&[
        (Category::Error, BACKUP_ERRORS),
        (Category::Warning, BACKUP_WARNINGS),
        (Category::Success, BACKUP_SUCCESS),
    ])
}

/// Catalog for syslog-style files
pub fn system_catalog() -> Result<PatternCatalog, regex::Error> {
    let mut catalog = PatternCatalog::from_table(&[
        (Category::Critical, SYSTEM_CRITICAL),
        (Category::Security, SYSTEM_SECURITY),
        (Category::Disk, SYSTEM_DISK),
        (Category::Memory, SYSTEM_MEMORY),
        (Category::Network, SYSTEM_NETWORK),
    ])?;
    catalog.add_rule(
        PatternRule::new(Category::Error, SYSTEM_GENERIC_ERROR)?
            .unless(SYSTEM_GENERIC_ERROR_EXCLUDE)?,
    );
    catalog.add_rule(PatternRule::new(Category::Warning, SYSTEM_GENERIC_WARNING)?);
    Ok(catalog)
}

/// Keyword-only catalog used by the weekly system log roll-up
pub fn weekly_system_catalog() -> Result<PatternCatalog, regex::Error> {
    let mut catalog = PatternCatalog::new();
    for (category, keywords) in [
        (Category::Critical, WEEKLY_CRITICAL),
        (Category::Security, WEEKLY_SECURITY),
        (Category::Disk, WEEKLY_DISK),
        (Category::Memory, WEEKLY_MEMORY),
        (Category::Network, WEEKLY_NETWORK),
    ] {
        for keyword in keywords {
            catalog.add_rule(PatternRule::keyword(category, keyword)?);
        }
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogs_compile() {
        assert_eq!(backup_catalog().unwrap().rule_count(), 17);
        assert_eq!(system_catalog().unwrap().rule_count(), 31);
        assert_eq!(weekly_system_catalog().unwrap().rule_count(), 12);
    }

    #[test]
    fn test_system_generic_error_skips_informational_lines() {
        let catalog = system_catalog().unwrap();
        let rule = &catalog.rules_for(Category::Error)[0];
        assert!(rule.find("sshd[42]: error: connect failed").is_some());
        assert!(rule.find("systemd[1]: Notice: unit failed to load").is_none());
    }

    #[test]
    fn test_backup_catalog_category_order() {
        let catalog = backup_catalog().unwrap();
        let order: Vec<Category> = catalog.entries().iter().map(|e| e.category).collect();
        assert_eq!(
            order,
            vec![Category::Error, Category::Warning, Category::Success]
        );
    }
}
