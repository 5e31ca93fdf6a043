//! Shared types for graph-based transliteration.
//!
//! - [`token`] -- the token vocabulary and whitespace configuration
//! - [`rule`] -- transliteration rules, cost assignment, rule sets and
//!   on-match insertion rules
//! - [`error`] -- per-call and rule-set error types

pub mod error;
pub mod rule;
pub mod token;

pub use error::{InvalidRuleSetError, TransliterationError};
pub use rule::{OnMatchRule, RuleSet, TransliterationRule, cost_of};
pub use token::{TokenVocabulary, WhitespaceConfig};
