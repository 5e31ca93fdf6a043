//! Rule graph engine for graph transliteration.
//!
//! This crate builds the search tree over a cost-sorted [`RuleSet`], finds
//! the best applicable rule at a token position, and checks rule sets for
//! ambiguity before use.
//!
//! # Architecture
//!
//! - [`graph`] -- Prefix tree over rule tokens with rule leaves and cost-ordered children
//! - [`config`] -- Match configuration (explicit search stack)
//! - [`matcher`] -- Best-first, backtracking rule search with lookaround checks
//! - [`ambiguity`] -- Build-time detection of equal-cost rules matching the same input
//!
//! [`RuleSet`]: graphtr_core::rule::RuleSet

pub mod ambiguity;
pub mod config;
pub mod graph;
pub mod matcher;

pub use ambiguity::{AmbiguityReport, AmbiguousRulesError, PatternSlot, check, ensure_unambiguous};
pub use config::{Frame, MatchConfig};
pub use graph::{Constraints, Edge, Node, OrderedChildren, RuleGraph};
pub use matcher::Matcher;
