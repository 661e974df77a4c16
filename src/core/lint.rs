/// Dictionary and template lint checks, shared by the `dictionary_linter` tool.

use crate::core::dictionary::Dictionary;
use crate::core::template::{Segment, TemplateLine};
use crate::schema::category::Category;

/// Pools smaller than this get a low-variety warning.
pub const MIN_POOL_SIZE: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Coverage and variety checks on a loaded dictionary.
pub fn lint_dictionary(dictionary: &Dictionary) -> LintReport {
    let mut report = LintReport::default();

    for category in Category::ALL {
        match dictionary.pool(category) {
            None => report
                .warnings
                .push(format!("No words for category {}", category)),
            Some(pool) if pool.len() < MIN_POOL_SIZE => report.warnings.push(format!(
                "Category {} has only {} words (minimum {} recommended)",
                category,
                pool.len(),
                MIN_POOL_SIZE
            )),
            Some(_) => {}
        }
    }

    report
}

/// Check every placeholder of `template` against `dictionary`.
///
/// Unknown names and categories with no words are errors, since either
/// would abort a real run.
pub fn lint_template(dictionary: &Dictionary, template: &str) -> LintReport {
    let mut report = LintReport::default();

    for (idx, line) in template.lines().enumerate() {
        let scanned = TemplateLine::scan(line);
        for name in scanned.placeholders() {
            match Category::resolve(name) {
                None => report.errors.push(format!(
                    "Line {}: placeholder '[{}]' names no known category",
                    idx + 1,
                    name
                )),
                Some(category) if dictionary.pool(category).is_none() => {
                    report.errors.push(format!(
                        "Line {}: placeholder '[{}]' needs {} words but the dictionary has none",
                        idx + 1,
                        name,
                        category
                    ))
                }
                Some(_) => {}
            }
        }
        // An unclosed `[` can only survive in the trailing literal.
        if matches!(scanned.segments.last(), Some(Segment::Literal(text)) if text.contains('[')) {
            report.warnings.push(format!(
                "Line {}: '[' without a closing ']' is kept as literal text",
                idx + 1
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary(entries: &[(Category, &str)]) -> Dictionary {
        entries.iter().map(|(c, w)| (*c, w.to_string())).collect()
    }

    #[test]
    fn full_dictionary_is_clean() {
        let entries: Vec<(Category, &str)> = Category::ALL
            .into_iter()
            .flat_map(|c| [(c, "a"), (c, "b"), (c, "c")])
            .collect();
        assert!(lint_dictionary(&dictionary(&entries)).is_clean());
    }

    #[test]
    fn missing_and_small_pools_warn() {
        let report = lint_dictionary(&dictionary(&[(Category::Noun, "cat")]));
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 7);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("NOUN has only 1 words")));
    }

    #[test]
    fn template_placeholders_are_checked() {
        let d = dictionary(&[(Category::Noun, "cat")]);
        let report = lint_template(&d, "A [noun].\n\nA [verb] and a [wizard].\nOpen [bracket");
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("Line 3:"));
        assert!(report.errors[0].contains("VERB"));
        assert!(report.errors[1].contains("'[wizard]'"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Line 4:"));
    }

    #[test]
    fn unclosed_bracket_after_placeholder_warns() {
        let d = dictionary(&[(Category::Noun, "cat")]);
        let report = lint_template(&d, "[noun] and [more\n[noun] and [noun]");
        assert!(report.errors.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("Line 1:"));
    }

    #[test]
    fn clean_template() {
        let d = dictionary(&[(Category::Noun, "cat")]);
        assert!(lint_template(&d, "The [NOUN] sat.\nNo placeholders here.").is_clean());
    }
}
