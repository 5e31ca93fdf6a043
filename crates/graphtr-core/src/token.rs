// Token vocabulary and whitespace configuration
//
// A token is a declared string of one or more characters. Each token carries
// a set of class labels which rules use as context constraints in place of
// enumerating tokens one by one.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TokenVocabulary
// ---------------------------------------------------------------------------

/// The declared input tokens and the classes attached to each of them.
///
/// Entries are kept ordered by token string so that every derived structure
/// (tokenizer trie, ambiguity candidate sets, snapshots) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenVocabulary {
    classes: BTreeMap<String, BTreeSet<String>>,
}

impl TokenVocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a token with its classes.
    ///
    /// Declaring the same token twice merges the class sets.
    pub fn insert<I, S>(&mut self, token: impl Into<String>, classes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes
            .entry(token.into())
            .or_default()
            .extend(classes.into_iter().map(Into::into));
    }

    /// Whether `token` has been declared.
    pub fn contains(&self, token: &str) -> bool {
        self.classes.contains_key(token)
    }

    /// Classes of a declared token, or `None` for an undeclared one.
    pub fn classes_of(&self, token: &str) -> Option<&BTreeSet<String>> {
        self.classes.get(token)
    }

    /// Whether `token` is declared and belongs to `class`.
    ///
    /// Undeclared tokens belong to no class.
    #[inline]
    pub fn has_class(&self, token: &str, class: &str) -> bool {
        self.classes
            .get(token)
            .is_some_and(|classes| classes.contains(class))
    }

    /// Whether any declared token carries `class`.
    pub fn has_declared_class(&self, class: &str) -> bool {
        self.classes.values().any(|classes| classes.contains(class))
    }

    /// Declared tokens in ascending string order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Declared tokens together with their classes.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.classes.iter().map(|(token, classes)| (token.as_str(), classes))
    }

    /// Every token carrying `class`.
    pub fn tokens_of_class(&self, class: &str) -> BTreeSet<&str> {
        self.iter()
            .filter(|(_, classes)| classes.contains(class))
            .map(|(token, _)| token)
            .collect()
    }

    /// Lookup table from class name to the tokens carrying it.
    pub fn tokens_by_class(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut out: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (token, classes) in self.iter() {
            for class in classes {
                out.entry(class.as_str()).or_default().insert(token);
            }
        }
        out
    }

    /// Number of declared tokens.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no token has been declared.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl<T, I, S> FromIterator<(T, I)> for TokenVocabulary
where
    T: Into<String>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<It: IntoIterator<Item = (T, I)>>(iter: It) -> Self {
        let mut vocabulary = Self::new();
        for (token, classes) in iter {
            vocabulary.insert(token, classes);
        }
        vocabulary
    }
}

// ---------------------------------------------------------------------------
// WhitespaceConfig
// ---------------------------------------------------------------------------

/// Whitespace handling for one transliterator.
///
/// The default token is used as the synthetic word boundary at both ends of
/// every tokenized input, and as the replacement for consolidated runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitespaceConfig {
    /// Token inserted at the input boundaries.
    #[serde(rename = "default")]
    pub default_token: String,
    /// Class shared by every whitespace token.
    pub token_class: String,
    /// Collapse runs of whitespace into one default token and drop runs at
    /// the input edges.
    pub consolidate: bool,
}

impl WhitespaceConfig {
    /// Create a whitespace configuration.
    pub fn new(
        default_token: impl Into<String>,
        token_class: impl Into<String>,
        consolidate: bool,
    ) -> Self {
        Self {
            default_token: default_token.into(),
            token_class: token_class.into(),
            consolidate,
        }
    }

    /// Whether `token` is whitespace according to `vocabulary`.
    #[inline]
    pub fn is_whitespace(&self, vocabulary: &TokenVocabulary, token: &str) -> bool {
        vocabulary.has_class(token, &self.token_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenVocabulary {
        [
            ("a", vec!["vowel"]),
            ("b", vec!["consonant"]),
            ("aa", vec!["vowel", "long"]),
            (" ", vec!["wb"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn vocabulary_lookup() {
        let v = sample();
        assert_eq!(v.len(), 4);
        assert!(v.contains("aa"));
        assert!(!v.contains("c"));
        assert!(v.has_class("aa", "long"));
        assert!(!v.has_class("a", "long"));
        assert!(!v.has_class("c", "vowel"));
    }

    #[test]
    fn vocabulary_tokens_are_sorted() {
        let v = sample();
        let tokens: Vec<&str> = v.tokens().collect();
        assert_eq!(tokens, vec![" ", "a", "aa", "b"]);
    }

    #[test]
    fn vocabulary_insert_merges_classes() {
        let mut v = TokenVocabulary::new();
        v.insert("a", ["x"]);
        v.insert("a", ["y"]);
        let classes: Vec<&str> = v.classes_of("a").unwrap().iter().map(String::as_str).collect();
        assert_eq!(classes, vec!["x", "y"]);
    }

    #[test]
    fn vocabulary_tokens_by_class() {
        let v = sample();
        let by_class = v.tokens_by_class();
        assert_eq!(by_class["vowel"], BTreeSet::from(["a", "aa"]));
        assert_eq!(by_class["wb"], BTreeSet::from([" "]));
        assert!(!by_class.contains_key("missing"));
        assert_eq!(v.tokens_of_class("consonant"), BTreeSet::from(["b"]));
        assert!(v.tokens_of_class("missing").is_empty());
    }

    #[test]
    fn vocabulary_declared_class() {
        let v = sample();
        assert!(v.has_declared_class("wb"));
        assert!(!v.has_declared_class("nasal"));
    }

    #[test]
    fn whitespace_membership() {
        let v = sample();
        let ws = WhitespaceConfig::new(" ", "wb", true);
        assert!(ws.is_whitespace(&v, " "));
        assert!(!ws.is_whitespace(&v, "a"));
        assert!(!ws.is_whitespace(&v, "\t"));
    }
}
