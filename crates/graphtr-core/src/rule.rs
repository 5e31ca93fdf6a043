// Transliteration rules, cost assignment, and on-match insertion rules

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidRuleSetError;

// ---------------------------------------------------------------------------
// Cost assignment
// ---------------------------------------------------------------------------

/// Cost of a rule whose matched context holds `context_len` tokens and
/// classes.
///
/// `log2(1 + 1 / (1 + n))` lies in (0, 1) and strictly decreases as `n`
/// grows, so rules requiring more context are tried first. Tokens and
/// classes weigh the same, which keeps costs bit-identical with rule sets
/// persisted by earlier releases.
#[inline]
pub fn cost_of(context_len: usize) -> f64 {
    (1.0 + 1.0 / (1.0 + context_len as f64)).log2()
}

// ---------------------------------------------------------------------------
// TransliterationRule
// ---------------------------------------------------------------------------

/// A context-sensitive rewrite rule.
///
/// The rule matches `tokens`, optionally preceded by `prev_classes` then
/// `prev_tokens`, and optionally followed by `next_tokens` then
/// `next_classes`. On a match, `production` is emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransliterationRule {
    pub production: String,
    pub prev_classes: Option<Vec<String>>,
    pub prev_tokens: Option<Vec<String>>,
    pub tokens: Vec<String>,
    pub next_tokens: Option<Vec<String>>,
    pub next_classes: Option<Vec<String>>,
    pub cost: f64,
}

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    if items.is_empty() { None } else { Some(items) }
}

impl TransliterationRule {
    /// Create a rule matching `tokens` without any context.
    pub fn new<I, S>(tokens: I, production: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rule = Self {
            production: production.into(),
            prev_classes: None,
            prev_tokens: None,
            tokens: owned(tokens),
            next_tokens: None,
            next_classes: None,
            cost: 0.0,
        };
        rule.cost = rule.computed_cost();
        rule
    }

    /// Require these tokens immediately before `tokens`.
    pub fn with_prev_tokens<I, S>(mut self, prev_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prev_tokens = non_empty(owned(prev_tokens));
        self.cost = self.computed_cost();
        self
    }

    /// Require tokens of these classes before `prev_tokens` (or `tokens`).
    pub fn with_prev_classes<I, S>(mut self, prev_classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prev_classes = non_empty(owned(prev_classes));
        self.cost = self.computed_cost();
        self
    }

    /// Require these tokens immediately after `tokens`.
    pub fn with_next_tokens<I, S>(mut self, next_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.next_tokens = non_empty(owned(next_tokens));
        self.cost = self.computed_cost();
        self
    }

    /// Require tokens of these classes after `next_tokens` (or `tokens`).
    pub fn with_next_classes<I, S>(mut self, next_classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.next_classes = non_empty(owned(next_classes));
        self.cost = self.computed_cost();
        self
    }

    /// Override the computed cost.
    ///
    /// Later `with_*` calls recompute the cost, so this must come last.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Number of tokens and classes this rule requires, lookaround included.
    pub fn context_len(&self) -> usize {
        self.tokens.len()
            + self.prev_count()
            + self.next_tokens.as_ref().map_or(0, Vec::len)
            + self.next_classes.as_ref().map_or(0, Vec::len)
    }

    /// Cost derived from [`context_len`](Self::context_len).
    pub fn computed_cost(&self) -> f64 {
        cost_of(self.context_len())
    }

    /// Positions required before the first matched token.
    pub fn prev_count(&self) -> usize {
        self.prev_classes.as_ref().map_or(0, Vec::len) + self.prev_tokens.as_ref().map_or(0, Vec::len)
    }

    /// Positions required from the first matched token onwards.
    pub fn curr_and_next_count(&self) -> usize {
        self.tokens.len()
            + self.next_tokens.as_ref().map_or(0, Vec::len)
            + self.next_classes.as_ref().map_or(0, Vec::len)
    }

    /// Whether the rule carries any lookbehind or lookahead requirement.
    pub fn has_constraints(&self) -> bool {
        self.prev_classes.is_some()
            || self.prev_tokens.is_some()
            || self.next_tokens.is_some()
            || self.next_classes.is_some()
    }
}

/// Renders the rule pattern in the easy-reading notation:
/// `<class>` for classes, parentheses around lookaround tokens.
impl fmt::Display for TransliterationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classes = |c: &[String]| {
            c.iter()
                .map(|class| format!("<{class}>"))
                .collect::<Vec<_>>()
                .join(" ")
        };

        match (&self.prev_classes, &self.prev_tokens) {
            (Some(c), Some(t)) => write!(f, "({} {}) ", classes(c), t.join(" "))?,
            (Some(c), None) => write!(f, "{} ", classes(c))?,
            (None, Some(t)) => write!(f, "({}) ", t.join(" "))?,
            (None, None) => {}
        }

        f.write_str(&self.tokens.join(" "))?;

        match (&self.next_tokens, &self.next_classes) {
            (Some(t), Some(c)) => write!(f, " ({} {})", t.join(" "), classes(c)),
            (Some(t), None) => write!(f, " ({})", t.join(" ")),
            (None, Some(c)) => write!(f, " {}", classes(c)),
            (None, None) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// Rules sorted by ascending cost.
///
/// The sort is stable: rules of equal cost keep their declaration order, and
/// rule indices everywhere in the engine refer to this sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<TransliterationRule>,
}

impl RuleSet {
    /// Validate and sort rules by cost.
    ///
    /// Error indices refer to the declaration order of `rules`.
    pub fn new(rules: Vec<TransliterationRule>) -> Result<Self, InvalidRuleSetError> {
        for (i, rule) in rules.iter().enumerate() {
            if rule.tokens.is_empty() {
                return Err(InvalidRuleSetError::EmptyTokens {
                    rule: i,
                    production: rule.production.clone(),
                });
            }
            if !rule.cost.is_finite() || rule.cost <= 0.0 || rule.cost >= 1.0 {
                return Err(InvalidRuleSetError::InvalidCost {
                    rule: i,
                    cost: rule.cost,
                });
            }
        }
        let mut rules = rules;
        rules.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        Ok(Self { rules })
    }

    /// Rules in ascending cost order.
    pub fn rules(&self) -> &[TransliterationRule] {
        &self.rules
    }

    /// Rule at a sorted index.
    pub fn get(&self, index: usize) -> Option<&TransliterationRule> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransliterationRule> {
        self.rules.iter()
    }

    /// Productions of each rule, in rule order.
    pub fn productions(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.production.as_str()).collect()
    }

    /// A new rule set without the rules producing any of `productions`.
    pub fn pruned_of<S: AsRef<str>>(&self, productions: &[S]) -> Self {
        let rules = self
            .rules
            .iter()
            .filter(|r| !productions.iter().any(|p| p.as_ref() == r.production))
            .cloned()
            .collect();
        Self { rules }
    }

    /// Compare the costs of two rules by sorted index.
    pub fn cmp_cost(&self, a: usize, b: usize) -> Ordering {
        self.rules[a].cost.total_cmp(&self.rules[b].cost)
    }
}

impl std::ops::Index<usize> for RuleSet {
    type Output = TransliterationRule;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rules[index]
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a TransliterationRule;
    type IntoIter = std::slice::Iter<'a, TransliterationRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

// ---------------------------------------------------------------------------
// OnMatchRule
// ---------------------------------------------------------------------------

/// Output inserted between two matches when the token classes at the
/// boundary fit.
///
/// `prev_classes` must end at the token just before the current match and
/// `next_classes` must start at its first token. On-match rules are tried in
/// declaration order and the first fitting one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnMatchRule {
    pub prev_classes: Vec<String>,
    pub next_classes: Vec<String>,
    pub production: String,
}

impl OnMatchRule {
    pub fn new<P, N, S, T>(prev_classes: P, next_classes: N, production: impl Into<String>) -> Self
    where
        P: IntoIterator<Item = S>,
        N: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            prev_classes: owned(prev_classes),
            next_classes: owned(next_classes),
            production: production.into(),
        }
    }

    /// Check the rule has both class lists filled.
    pub fn validate(&self, index: usize) -> Result<(), InvalidRuleSetError> {
        let field = if self.prev_classes.is_empty() {
            "prev_classes"
        } else if self.next_classes.is_empty() {
            "next_classes"
        } else {
            return Ok(());
        };
        Err(InvalidRuleSetError::EmptyOnMatchClasses {
            rule: index,
            production: self.production.clone(),
            field,
        })
    }
}
