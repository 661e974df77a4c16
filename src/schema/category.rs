use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of word categories a placeholder can ask for.
///
/// Template placeholders and dictionary `type` values both resolve to one
/// of these tags. Resolution folds ASCII case only, so `[Person]`,
/// `[person]` and `[PERSON]` are the same category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Number,
    Adjective,
    Adverb,
    Place,
    Person,
    Noun,
    Verb,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 7] = [
        Self::Number,
        Self::Adjective,
        Self::Adverb,
        Self::Place,
        Self::Person,
        Self::Noun,
        Self::Verb,
    ];

    /// Canonical upper-case name (e.g., "PERSON").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number => "NUMBER",
            Self::Adjective => "ADJECTIVE",
            Self::Adverb => "ADVERB",
            Self::Place => "PLACE",
            Self::Person => "PERSON",
            Self::Noun => "NOUN",
            Self::Verb => "VERB",
        }
    }

    /// Resolve a category name, ignoring ASCII case.
    pub fn resolve(name: &str) -> Option<Category> {
        let upper = name.to_ascii_uppercase();
        Self::ALL.into_iter().find(|c| c.name() == upper)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string names no known category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategoryName(pub String);

impl fmt::Display for UnknownCategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategoryName {}

impl FromStr for Category {
    type Err = UnknownCategoryName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s).ok_or_else(|| UnknownCategoryName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_ignores_ascii_case() {
        assert_eq!(Category::resolve("person"), Some(Category::Person));
        assert_eq!(Category::resolve("PERSON"), Some(Category::Person));
        assert_eq!(Category::resolve("AdJeCtIvE"), Some(Category::Adjective));
    }

    #[test]
    fn resolve_rejects_unknown_and_empty() {
        assert_eq!(Category::resolve("wizard"), None);
        assert_eq!(Category::resolve(""), None);
        assert_eq!(Category::resolve(" noun"), None);
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for cat in Category::ALL {
            assert_eq!(cat.name().parse::<Category>(), Ok(cat));
            assert_eq!(cat.to_string(), cat.name());
        }
    }

    #[test]
    fn from_str_error_keeps_original_spelling() {
        let err = "Wizard".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategoryName("Wizard".to_string()));
        assert_eq!(err.to_string(), "unknown category 'Wizard'");
    }
}
