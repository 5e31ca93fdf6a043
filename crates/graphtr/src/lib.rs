//! Rule-based graph transliteration.
//!
//! Input is segmented into declared tokens, then at each position the most
//! specific applicable rule is found in a cost-ordered rule graph and its
//! production emitted. On-match rules insert output between matches whose
//! surrounding token classes fit.
//!
//! # Architecture
//!
//! - [`tokenizer`] -- Longest-match tokenizer with whitespace consolidation
//! - [`onmatch`] -- On-match insertion rules with a token-pair lookup index
//! - [`settings`] -- Serde-facing settings, construction options and reference checks
//! - [`transliterator`] -- The transliteration driver, snapshots and introspection
//!
//! The data model lives in `graphtr-core` and the rule graph, matcher and
//! ambiguity checker in `graphtr-graph`; both are re-exported here.

pub mod onmatch;
pub mod settings;
pub mod tokenizer;
pub mod transliterator;

pub use graphtr_core::{
    InvalidRuleSetError, OnMatchRule, RuleSet, TokenVocabulary, TransliterationError,
    TransliterationRule, WhitespaceConfig, cost_of,
};
pub use graphtr_graph::{AmbiguityReport, AmbiguousRulesError, PatternSlot, RuleGraph};
pub use settings::{RuleSpec, Settings, TransliteratorOptions};
pub use transliterator::{Transliteration, Transliterator, TransliteratorSnapshot};

/// Error type for transliterator construction failures.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The rules or settings are malformed.
    #[error("invalid rule set: {0}")]
    InvalidRuleSet(#[from] InvalidRuleSetError),

    /// Some equal-cost rules can match the same input.
    #[error("{0}")]
    Ambiguous(#[from] AmbiguousRulesError),
}
