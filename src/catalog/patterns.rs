//! Data-driven pattern tables
//!
//! A catalog is an ordered table of `category -> ordered rule list`. Adding a
//! category or a rule is a data change; the classifier iterates the table
//! uniformly.

use crate::findings::Category;
use regex::{Regex, RegexBuilder};

/// One case-insensitive matcher bound to a category
#[derive(Debug, Clone)]
pub struct PatternRule {
    category: Category,
    pattern: Regex,
    /// Line is rejected by this rule when the exclusion also matches
    exclude: Option<Regex>,
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

impl PatternRule {
    /// Create a rule from a regular expression (matched case-insensitively)
    pub fn new(category: Category, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            category,
            pattern: compile(pattern)?,
            exclude: None,
        })
    }

    /// Create a rule that matches a literal keyword anywhere in the line
    pub fn keyword(category: Category, keyword: &str) -> Result<Self, regex::Error> {
        Self::new(category, &regex::escape(keyword))
    }

    /// Reject lines that also match `pattern`
    pub fn unless(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.exclude = Some(compile(pattern)?);
        Ok(self)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Return the matched substring if this rule applies to `line`
    pub fn find<'a>(&self, line: &'a str) -> Option<&'a str> {
        let found = self.pattern.find(line)?;
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(line) {
                return None;
            }
        }
        Some(found.as_str())
    }
}

/// Ordered rule list for a single category
#[derive(Debug, Clone)]
pub struct CategoryRules {
    pub category: Category,
    pub rules: Vec<PatternRule>,
}

/// Table of categories and their ordered rules
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    entries: Vec<CategoryRules>,
}

impl PatternCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from `(category, patterns)` rows
    ///
    /// # Errors
    ///
    /// Returns the first `regex::Error` hit while compiling a pattern.
    pub fn from_table(table: &[(Category, &[&str])]) -> Result<Self, regex::Error> {
        let mut catalog = Self::new();
        for (category, patterns) in table {
            for pattern in *patterns {
                catalog.add_rule(PatternRule::new(*category, pattern)?);
            }
        }
        Ok(catalog)
    }

    /// Build a catalog where every keyword is a literal rule of `category`
    pub fn from_keywords<S: AsRef<str>>(
        category: Category,
        keywords: &[S],
    ) -> Result<Self, regex::Error> {
        let mut catalog = Self::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim();
            if keyword.is_empty() {
                continue;
            }
            catalog.add_rule(PatternRule::keyword(category, keyword)?);
        }
        Ok(catalog)
    }

    /// Append a rule to the end of its category's list
    pub fn add_rule(&mut self, rule: PatternRule) {
        match self
            .entries
            .iter_mut()
            .find(|entry| entry.category == rule.category)
        {
            Some(entry) => entry.rules.push(rule),
            None => self.entries.push(CategoryRules {
                category: rule.category,
                rules: vec![rule],
            }),
        }
    }

    /// Category tables in insertion order
    pub fn entries(&self) -> &[CategoryRules] {
        &self.entries
    }

    /// Rules configured for one category
    pub fn rules_for(&self, category: Category) -> &[PatternRule] {
        self.entries
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.rules.as_slice())
            .unwrap_or(&[])
    }

    pub fn rule_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.rules.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count() == 0
    }
}
