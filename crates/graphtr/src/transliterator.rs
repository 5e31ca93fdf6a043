// Transliterator: top-level integration point
//
// Owns the vocabulary, the cost-sorted rules, the rule graph, the tokenizer
// and the on-match engine, and drives one transliteration pass:
// tokenize, match at each position, insert on-match output, emit the rule
// production, advance past the matched tokens.
//
// Everything except the last-call bookkeeping is read-only after
// construction. That bookkeeping sits behind a `Mutex` so a single instance
// can be shared across threads; concurrent callers that need per-call
// results use `transliterate_details` instead.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use graphtr_core::error::TransliterationError;
use graphtr_core::rule::{OnMatchRule, RuleSet, TransliterationRule};
use graphtr_core::token::{TokenVocabulary, WhitespaceConfig};
use graphtr_graph::ambiguity::{self, AmbiguityReport};
use graphtr_graph::graph::RuleGraph;
use graphtr_graph::matcher::Matcher;
use serde::{Deserialize, Serialize};

use crate::BuildError;
use crate::onmatch::OnMatchEngine;
use crate::settings::{Settings, TransliteratorOptions, check_references};
use crate::tokenizer::Tokenizer;

/// Result of one transliteration call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transliteration {
    pub output: String,
    /// Indices of the applied rules, in application order.
    pub matched_rules: Vec<usize>,
    /// Boundary-padded token sequence the rules were matched against.
    pub input_tokens: Vec<String>,
    /// Errors skipped under `ignore_errors`.
    pub errors: Vec<TransliterationError>,
}

#[derive(Debug, Default)]
struct LastCall {
    matched_rules: Vec<usize>,
    input_tokens: Vec<String>,
}

/// A built transliterator, persisted without its derived lookup tables.
///
/// Restoring a snapshot skips validation, ambiguity checking and graph
/// construction, so snapshots must come from a previously built
/// [`Transliterator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransliteratorSnapshot {
    pub tokens: TokenVocabulary,
    pub rules: RuleSet,
    pub onmatch_rules: Vec<OnMatchRule>,
    pub whitespace: WhitespaceConfig,
    pub metadata: BTreeMap<String, String>,
    pub graph: RuleGraph,
    /// Options in effect when the snapshot was taken. `pruned_of` on the
    /// restored engine runs the checks these ask for.
    #[serde(default)]
    pub options: TransliteratorOptions,
}

/// Rule-based graph transliterator.
#[derive(Debug)]
pub struct Transliterator {
    vocabulary: TokenVocabulary,
    rules: RuleSet,
    whitespace: WhitespaceConfig,
    metadata: BTreeMap<String, String>,
    graph: RuleGraph,
    tokenizer: Tokenizer,
    onmatch: OnMatchEngine,
    options: TransliteratorOptions,
    last_call: Mutex<LastCall>,
}

impl Transliterator {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Build a transliterator from validated parts.
    ///
    /// On-match rules are always checked for empty class lists. Cross
    /// references and ambiguity are checked as `options` ask.
    pub fn new(
        vocabulary: TokenVocabulary,
        rules: RuleSet,
        onmatch_rules: Vec<OnMatchRule>,
        whitespace: WhitespaceConfig,
        options: TransliteratorOptions,
    ) -> Result<Self, BuildError> {
        for (i, rule) in onmatch_rules.iter().enumerate() {
            rule.validate(i)?;
        }
        if options.check_settings {
            check_references(&vocabulary, &rules, &onmatch_rules, &whitespace)?;
        }
        if options.check_ambiguity {
            ambiguity::ensure_unambiguous(&rules, &vocabulary)?;
        }
        let graph = RuleGraph::build(&rules);
        Ok(Self::assemble(
            vocabulary,
            rules,
            onmatch_rules,
            whitespace,
            BTreeMap::new(),
            graph,
            options,
        ))
    }

    /// Build a transliterator from deserialized settings.
    pub fn from_settings(settings: Settings, options: TransliteratorOptions) -> Result<Self, BuildError> {
        let rules = settings.rule_set()?;
        let Settings {
            tokens,
            onmatch_rules,
            whitespace,
            metadata,
            ..
        } = settings;
        let mut transliterator = Self::new(tokens, rules, onmatch_rules, whitespace, options)?;
        transliterator.metadata = metadata;
        Ok(transliterator)
    }

    /// Restore a snapshot without re-validating it.
    ///
    /// The restored engine keeps the snapshot's options.
    pub fn from_snapshot(snapshot: TransliteratorSnapshot) -> Self {
        let TransliteratorSnapshot {
            tokens,
            rules,
            onmatch_rules,
            whitespace,
            metadata,
            graph,
            options,
        } = snapshot;
        Self::assemble(tokens, rules, onmatch_rules, whitespace, metadata, graph, options)
    }

    fn assemble(
        vocabulary: TokenVocabulary,
        rules: RuleSet,
        onmatch_rules: Vec<OnMatchRule>,
        whitespace: WhitespaceConfig,
        metadata: BTreeMap<String, String>,
        graph: RuleGraph,
        options: TransliteratorOptions,
    ) -> Self {
        let tokenizer = Tokenizer::new(&vocabulary, whitespace.clone());
        let onmatch = OnMatchEngine::new(onmatch_rules, &vocabulary);
        log::debug!(
            "transliterator ready: {} tokens, {} rules, {} on-match rules",
            vocabulary.len(),
            rules.len(),
            onmatch.rules().len()
        );
        Self {
            vocabulary,
            rules,
            whitespace,
            metadata,
            graph,
            tokenizer,
            onmatch,
            options,
            last_call: Mutex::new(LastCall::default()),
        }
    }

    /// Persistable form of this transliterator.
    pub fn snapshot(&self) -> TransliteratorSnapshot {
        TransliteratorSnapshot {
            tokens: self.vocabulary.clone(),
            rules: self.rules.clone(),
            onmatch_rules: self.onmatch.rules().to_vec(),
            whitespace: self.whitespace.clone(),
            metadata: self.metadata.clone(),
            graph: self.graph.clone(),
            options: self.options,
        }
    }

    /// A new transliterator without the rules producing any of
    /// `productions`.
    ///
    /// The graph is rebuilt and the construction checks of this instance
    /// are run again.
    pub fn pruned_of<S: AsRef<str>>(&self, productions: &[S]) -> Result<Self, BuildError> {
        let rules = self.rules.pruned_of(productions);
        log::debug!(
            "pruned {} of {} rules",
            self.rules.len() - rules.len(),
            self.rules.len()
        );
        let mut pruned = Self::new(
            self.vocabulary.clone(),
            rules,
            self.onmatch.rules().to_vec(),
            self.whitespace.clone(),
            self.options,
        )?;
        pruned.metadata = self.metadata.clone();
        Ok(pruned)
    }

    // -----------------------------------------------------------------------
    // Options
    // -----------------------------------------------------------------------

    pub fn ignore_errors(&self) -> bool {
        self.options.ignore_errors
    }

    /// Set whether unrecognizable characters and unmatched tokens are
    /// skipped instead of failing the call.
    pub fn set_ignore_errors(&mut self, value: bool) {
        self.options.ignore_errors = value;
    }

    // -----------------------------------------------------------------------
    // Transliteration
    // -----------------------------------------------------------------------

    /// Transliterate `input`.
    pub fn transliterate(&self, input: &str) -> Result<String, TransliterationError> {
        self.transliterate_details(input).map(|t| t.output)
    }

    /// Transliterate `input`, returning the applied rules and token
    /// sequence with the output.
    pub fn transliterate_details(&self, input: &str) -> Result<Transliteration, TransliterationError> {
        let mut errors = Vec::new();
        let tokens = if self.options.ignore_errors {
            self.tokenizer.tokenize_skipping(input, &mut errors)
        } else {
            self.tokenizer.tokenize(input)?
        };

        let matcher = self.matcher();
        let mut config = matcher.new_config();
        let mut output = String::new();
        let mut matched_rules = Vec::new();

        // Skip the leading boundary; stop before the trailing one.
        let mut position = 1;
        while position + 1 < tokens.len() {
            let Some(index) = matcher.best_match(&mut config, &tokens, position) else {
                let error = TransliterationError::NoMatchingRule {
                    position,
                    token: tokens[position].clone(),
                };
                log::warn!("{error} in {tokens:?}");
                if self.options.ignore_errors {
                    errors.push(error);
                    position += 1;
                    continue;
                }
                return Err(error);
            };

            if let Some(inserted) = self.onmatch.production_at(&tokens, position, &self.vocabulary) {
                output.push_str(inserted);
            }
            let rule = &self.rules[index];
            output.push_str(&rule.production);
            matched_rules.push(index);
            position += rule.tokens.len();
        }

        let mut last = self.last_call.lock().unwrap_or_else(PoisonError::into_inner);
        last.matched_rules.clone_from(&matched_rules);
        last.input_tokens.clone_from(&tokens);

        Ok(Transliteration {
            output,
            matched_rules,
            input_tokens: tokens,
            errors,
        })
    }

    /// Tokenize `input`, including the boundary tokens.
    ///
    /// Under `ignore_errors`, unrecognizable characters are skipped.
    pub fn tokenize(&self, input: &str) -> Result<Vec<String>, TransliterationError> {
        if self.options.ignore_errors {
            Ok(self.tokenizer.tokenize_skipping(input, &mut Vec::new()))
        } else {
            self.tokenizer.tokenize(input)
        }
    }

    /// Index of the best rule matching `tokens` at `position`.
    pub fn match_at<S: AsRef<str>>(&self, position: usize, tokens: &[S]) -> Option<usize> {
        self.matcher().match_at(tokens, position)
    }

    /// Indices of every rule matching `tokens` at `position`, best first.
    pub fn match_all_at<S: AsRef<str>>(&self, position: usize, tokens: &[S]) -> Vec<usize> {
        self.matcher().match_all_at(tokens, position)
    }

    /// Report every ambiguous rule pair. Each report is also logged.
    pub fn check_for_ambiguity(&self) -> Vec<AmbiguityReport> {
        ambiguity::check(&self.rules, &self.vocabulary)
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.graph, &self.rules, &self.vocabulary)
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn vocabulary(&self) -> &TokenVocabulary {
        &self.vocabulary
    }

    /// Rules in ascending cost order.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Productions of every rule, in rule order.
    pub fn productions(&self) -> Vec<&str> {
        self.rules.productions()
    }

    pub fn onmatch_rules(&self) -> &[OnMatchRule] {
        self.onmatch.rules()
    }

    pub fn whitespace(&self) -> &WhitespaceConfig {
        &self.whitespace
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn graph(&self) -> &RuleGraph {
        &self.graph
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Rules applied by the last successful call.
    pub fn last_matched_rules(&self) -> Vec<&TransliterationRule> {
        let indices = self
            .last_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .matched_rules
            .clone();
        indices.into_iter().map(|i| &self.rules[i]).collect()
    }

    /// Tokens of each rule applied by the last successful call.
    pub fn last_matched_rule_tokens(&self) -> Vec<Vec<String>> {
        self.last_matched_rules()
            .into_iter()
            .map(|rule| rule.tokens.clone())
            .collect()
    }

    /// Token sequence of the last successful call, boundaries included.
    pub fn last_input_tokens(&self) -> Vec<String> {
        self.last_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .input_tokens
            .clone()
    }
}
