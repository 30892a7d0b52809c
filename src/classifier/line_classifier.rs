use crate::catalog::PatternCatalog;
use crate::findings::Category;

/// One category a line was classified into, with the substring that matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch<'a> {
    pub category: Category,
    pub matched: &'a str,
}

/// Classifies single log lines against a pattern catalog
///
/// Every category of the catalog is evaluated for every line. Within one
/// category the rules are tried in declared order and the first match is the
/// only one reported, so a line is never counted twice in the same category.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    catalog: PatternCatalog,
}

impl LineClassifier {
    /// Create a classifier over the given catalog
    pub fn new(catalog: PatternCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Classify one trimmed, non-empty line
    ///
    /// Returns one entry per matching category, in catalog order. An empty
    /// result means the line is not interesting and produces no finding.
    pub fn classify<'a>(&self, line: &'a str) -> Vec<LineMatch<'a>> {
        let mut matches = Vec::new();

        for entry in self.catalog.entries() {
            for rule in &entry.rules {
                if let Some(matched) = rule.find(line) {
                    matches.push(LineMatch {
                        category: entry.category,
                        matched,
                    });
                    break;
                }
            }
        }

        matches
    }

    /// Categories a line belongs to, without the matched text
    pub fn categories(&self, line: &str) -> Vec<Category> {
        self.classify(line).into_iter().map(|m| m.category).collect()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::catalog::{PatternCatalog, PatternRule};
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    /// Lines built only from characters that no keyword below can match
    #[derive(Debug, Clone)]
    struct NeutralLine(String);

    impl Arbitrary for NeutralLine {
        fn arbitrary(g: &mut Gen) -> Self {
            let alphabet = ['0', '1', '2', '3', ' ', ':', '-', '.', '/', 'q', 'z', 'x'];
            let len = usize::arbitrary(g) % 80 + 1;
            let line: String = (0..len)
                .map(|_| *g.choose(&alphabet).unwrap_or(&'q'))
                .collect();
            NeutralLine(line)
        }
    }

    fn keyword_classifier() -> LineClassifier {
        let mut catalog =
            PatternCatalog::from_keywords(Category::Error, &["error", "fail", "denied"]).unwrap();
        catalog.add_rule(PatternRule::keyword(Category::Warning, "warn").unwrap());
        LineClassifier::new(catalog)
    }

    #[quickcheck]
    fn prop_neutral_lines_have_no_categories(line: NeutralLine) -> bool {
        keyword_classifier().classify(&line.0).is_empty()
    }

    #[quickcheck]
    fn prop_at_most_one_match_per_category(prefix: NeutralLine, suffix: NeutralLine) -> bool {
        let line = format!("{} error fail denied warn {}", prefix.0, suffix.0);
        let matches = keyword_classifier().classify(&line);
        let errors = matches.iter().filter(|m| m.category == Category::Error).count();
        let warnings = matches
            .iter()
            .filter(|m| m.category == Category::Warning)
            .count();
        errors == 1 && warnings == 1
    }
}
