// Best-first rule matching over the rule graph
//
// The search is a depth-first walk with an explicit stack whose children are
// pushed so that cheaper branches pop first. Token edges consume one input
// token; rule-leaf edges consume nothing and carry the lookaround
// requirements. Branches whose cheapest rule costs more than the best match
// found so far are skipped.

use graphtr_core::rule::RuleSet;
use graphtr_core::token::TokenVocabulary;

use crate::config::{Frame, MatchConfig};
use crate::graph::{Constraints, Node, RuleGraph};

/// Upper bound on the initial stack allocation of a fresh configuration.
const MAX_INITIAL_STACK: usize = 256;

/// Finds the rules that apply at a position of a token sequence.
///
/// The matcher borrows the graph, the rules it was built from, and the
/// vocabulary used to resolve class requirements. Rule indices it returns
/// refer to the cost-sorted [`RuleSet`].
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    graph: &'a RuleGraph,
    rules: &'a RuleSet,
    vocabulary: &'a TokenVocabulary,
}

impl<'a> Matcher<'a> {
    pub fn new(graph: &'a RuleGraph, rules: &'a RuleSet, vocabulary: &'a TokenVocabulary) -> Self {
        Self {
            graph,
            rules,
            vocabulary,
        }
    }

    /// Create a search configuration sized for this graph.
    pub fn new_config(&self) -> MatchConfig {
        MatchConfig::new(self.graph.node_count().min(MAX_INITIAL_STACK))
    }

    /// Index of the best rule applying at `start`, if any.
    ///
    /// The best rule is the one with the lowest cost; among equal costs the
    /// one declared first wins.
    pub fn match_at<S: AsRef<str>>(&self, tokens: &[S], start: usize) -> Option<usize> {
        let mut config = self.new_config();
        self.best_match(&mut config, tokens, start)
    }

    /// Indices of every rule applying at `start`, in ascending order.
    pub fn match_all_at<S: AsRef<str>>(&self, tokens: &[S], start: usize) -> Vec<usize> {
        let mut config = self.new_config();
        self.all_matches(&mut config, tokens, start).to_vec()
    }

    /// [`match_at`](Self::match_at) reusing a caller-owned configuration.
    pub fn best_match<S: AsRef<str>>(
        &self,
        config: &mut MatchConfig,
        tokens: &[S],
        start: usize,
    ) -> Option<usize> {
        self.search(config, tokens, start, true);
        let best = config.best();
        if let Some(rule) = best {
            log::trace!(
                "rule {} ({}) matched at token {}",
                rule,
                self.rules[rule],
                start
            );
        }
        best
    }

    /// [`match_all_at`](Self::match_all_at) reusing a caller-owned
    /// configuration. The result borrows the configuration.
    pub fn all_matches<'c, S: AsRef<str>>(
        &self,
        config: &'c mut MatchConfig,
        tokens: &[S],
        start: usize,
    ) -> &'c [usize] {
        self.search(config, tokens, start, false);
        config.matches.sort_unstable();
        &config.matches
    }

    fn search<S: AsRef<str>>(&self, config: &mut MatchConfig, tokens: &[S], start: usize, prune: bool) {
        config.reset();
        if start >= tokens.len() {
            return;
        }
        config.stack.push(Frame {
            node: RuleGraph::START,
            position: start,
            cost: 0.0,
        });

        while let Some(frame) = config.stack.pop() {
            if prune && frame.cost > config.best_cost {
                continue;
            }
            match self.graph.node(frame.node) {
                Node::Rule { rule } => {
                    let satisfied = match self
                        .graph
                        .edge_into(frame.node)
                        .and_then(|e| e.constraints.as_ref())
                    {
                        Some(constraints) => {
                            self.constraints_hold(constraints, tokens, start, frame.position)
                        }
                        None => true,
                    };
                    if satisfied {
                        config.record(*rule, frame.cost);
                    }
                }
                Node::Start | Node::Token { .. } => self.expand(config, tokens, frame),
            }
        }
    }

    /// Push the children of `frame` so that the cheapest pops first.
    fn expand<S: AsRef<str>>(&self, config: &mut MatchConfig, tokens: &[S], frame: Frame) {
        let children = self.graph.ordered_children(frame.node);
        let leaves = children.rules();
        let token_child = tokens
            .get(frame.position)
            .and_then(|t| children.token_child(t.as_ref()));

        let leaf_frame = |node: usize| Frame {
            node,
            position: frame.position,
            cost: self.graph.cost_into(node),
        };

        match token_child {
            Some(child) => {
                let cost = self.graph.cost_into(child);
                // Leaves strictly cheaper than the token branch go above it.
                let split = leaves.partition_point(|&n| self.graph.cost_into(n) < cost);
                config.stack.extend(leaves[split..].iter().rev().map(|&n| leaf_frame(n)));
                config.stack.push(Frame {
                    node: child,
                    position: frame.position + 1,
                    cost,
                });
                config.stack.extend(leaves[..split].iter().rev().map(|&n| leaf_frame(n)));
            }
            None => config.stack.extend(leaves.iter().rev().map(|&n| leaf_frame(n))),
        }
    }

    /// Check lookaround requirements for a match spanning `start..end`.
    ///
    /// Previous classes sit immediately before previous tokens, and next
    /// classes immediately after next tokens. Requirements reaching outside
    /// the sequence fail.
    pub fn constraints_hold<S: AsRef<str>>(
        &self,
        constraints: &Constraints,
        tokens: &[S],
        start: usize,
        end: usize,
    ) -> bool {
        let mut prev_end = start;
        if let Some(prev_tokens) = &constraints.prev_tokens {
            let Some(from) = start.checked_sub(prev_tokens.len()) else {
                return false;
            };
            if !tokens_equal(&tokens[from..start], prev_tokens) {
                return false;
            }
            prev_end = from;
        }
        if let Some(prev_classes) = &constraints.prev_classes {
            let Some(from) = prev_end.checked_sub(prev_classes.len()) else {
                return false;
            };
            if !self.classes_fit(&tokens[from..prev_end], prev_classes) {
                return false;
            }
        }

        let mut next_start = end;
        if let Some(next_tokens) = &constraints.next_tokens {
            let to = end + next_tokens.len();
            if to > tokens.len() || !tokens_equal(&tokens[end..to], next_tokens) {
                return false;
            }
            next_start = to;
        }
        if let Some(next_classes) = &constraints.next_classes {
            let to = next_start + next_classes.len();
            if to > tokens.len() || !self.classes_fit(&tokens[next_start..to], next_classes) {
                return false;
            }
        }
        true
    }

    fn classes_fit<S: AsRef<str>>(&self, tokens: &[S], classes: &[String]) -> bool {
        tokens
            .iter()
            .zip(classes)
            .all(|(token, class)| self.vocabulary.has_class(token.as_ref(), class))
    }
}

fn tokens_equal<S: AsRef<str>>(tokens: &[S], expected: &[String]) -> bool {
    tokens.len() == expected.len() && tokens.iter().zip(expected).all(|(t, e)| t.as_ref() == e)
}
