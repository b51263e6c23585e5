//! C7: keyword normalizer.
//!
//! Normalizes raw keyword-filter input into a token set with AND semantics:
//! every token must match either the file name or the directory (OR'd across
//! the two fields, ANDed across tokens).

/// A normalized keyword filter, ready to test against a name/directory pair
/// or to fold into a SQL `LIKE` predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeywordFilter {
    tokens: Vec<String>,
}

impl KeywordFilter {
    /// Replace control characters (`0x00..=0x1F`, `0x7F`) with a space,
    /// collapse whitespace runs, lowercase, and split into tokens. An
    /// all-whitespace or empty input normalizes to no filter (matches
    /// everything).
    pub fn normalize(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();
        let tokens = cleaned
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True if every token matches the file name or the directory (case
    /// already lowered on both sides by the caller via [`Self::normalize`]
    /// semantics: callers should lowercase `name`/`directory` before calling).
    pub fn matches(&self, name: &str, directory: &str) -> bool {
        if self.tokens.is_empty() {
            return true;
        }
        let name_lower = name.to_lowercase();
        let dir_lower = directory.to_lowercase();
        self.tokens
            .iter()
            .all(|t| name_lower.contains(t.as_str()) || dir_lower.contains(t.as_str()))
    }

    /// Cache/query key: the tokens joined and sorted, so `"foo bar"` and
    /// `"bar  foo"` hit the same cache slot.
    pub fn cache_key(&self) -> String {
        let mut sorted = self.tokens.clone();
        sorted.sort();
        sorted.join(" ")
    }
}
