//! Registry lookup selectors.

use regex::Regex;

/// Selects registry entries by their locator.
#[derive(Clone, Debug)]
pub enum Selector {
    /// Locator contains the given text.
    Contains(String),
    /// Locator matches the regular expression (unanchored).
    Pattern(Regex),
}

impl Selector {
    pub fn matches(&self, locator: &str) -> bool {
        match self {
            Selector::Contains(needle) => locator.contains(needle.as_str()),
            Selector::Pattern(re) => re.is_match(locator),
        }
    }
}

impl From<&str> for Selector {
    fn from(needle: &str) -> Self {
        Selector::Contains(needle.to_owned())
    }
}

impl From<String> for Selector {
    fn from(needle: String) -> Self {
        Selector::Contains(needle)
    }
}

impl From<Regex> for Selector {
    fn from(re: Regex) -> Self {
        Selector::Pattern(re)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Tests can panic")]
mod tests {
    use super::*;

    #[test]
    fn substring_and_pattern() {
        let by_text = Selector::from("lib/");
        assert!(by_text.matches("page:/lib/util"));
        assert!(!by_text.matches("page:/app/main"));

        let by_pattern = Selector::from(Regex::new(r"/(util|main)$").unwrap());
        assert!(by_pattern.matches("page:/lib/util"));
        assert!(by_pattern.matches("page:/app/main"));
        assert!(!by_pattern.matches("page:/app/main.css"));
    }

    #[test]
    fn empty_substring_matches_everything() {
        assert!(Selector::from("").matches("anything"));
    }
}
