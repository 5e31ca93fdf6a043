// Build-time detection of rules that can match the same input
//
// Every rule is laid out as a row of per-position candidate token sets,
// aligned so that the first matched token of each rule falls in the same
// column. Two equal-cost rules collide when their rows intersect in every
// column, unless a strictly cheaper rule covers the whole intersection and
// would always be chosen first. Padding columns may fall outside the token
// sequence, where no cheaper rule requiring a token there can match.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;

use graphtr_core::rule::{RuleSet, TransliterationRule};
use graphtr_core::token::TokenVocabulary;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Tokens possible at one position of an overlapping pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternSlot {
    /// Any declared token.
    Any,
    /// One of these tokens.
    Tokens(BTreeSet<String>),
}

impl fmt::Display for PatternSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Tokens(tokens) => {
                f.write_str("{")?;
                for (i, token) in tokens.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{token:?}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Two equal-cost rules that can both match the same token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguityReport {
    /// Index of the earlier rule in the sorted rule set.
    pub first: usize,
    /// Index of the later rule in the sorted rule set.
    pub second: usize,
    /// The earlier rule in easy-reading notation.
    pub first_rule: String,
    /// The later rule in easy-reading notation.
    pub second_rule: String,
    /// Tokens both rules accept, position by position.
    pub pattern: Vec<PatternSlot>,
}

impl fmt::Display for AmbiguityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the pattern [")?;
        for (i, slot) in self.pattern.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{slot}")?;
        }
        write!(
            f,
            "] can be matched by both:\n  {}\n  {}",
            self.first_rule, self.second_rule
        )
    }
}

/// Raised when a rule set contains ambiguous rule pairs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rule set contains {} ambiguous rule pair(s)", .pairs.len())]
pub struct AmbiguousRulesError {
    pub pairs: Vec<AmbiguityReport>,
}

// ---------------------------------------------------------------------------
// Candidate rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot<'a> {
    Any,
    Set(BTreeSet<&'a str>),
}

impl<'a> Slot<'a> {
    fn single(token: &'a str) -> Self {
        Self::Set(BTreeSet::from([token]))
    }

    fn class(by_class: &BTreeMap<&'a str, BTreeSet<&'a str>>, class: &str) -> Self {
        Self::Set(by_class.get(class).cloned().unwrap_or_default())
    }

    fn intersect(&self, other: &Self) -> Option<Self> {
        let slot = match (self, other) {
            (Self::Any, Self::Any) => Self::Any,
            (Self::Any, Self::Set(s)) | (Self::Set(s), Self::Any) => Self::Set(s.clone()),
            (Self::Set(a), Self::Set(b)) => Self::Set(a.intersection(b).copied().collect()),
        };
        match &slot {
            Self::Set(s) if s.is_empty() => None,
            _ => Some(slot),
        }
    }

    /// Whether `other` accepts everything this slot accepts. An `Any` slot
    /// whose position may lie outside the token sequence is only covered by
    /// another `Any`.
    fn covered_by(&self, other: &Self, all_tokens: &BTreeSet<&str>, present: bool) -> bool {
        match (self, other) {
            (_, Self::Any) => true,
            (Self::Any, Self::Set(s)) => present && all_tokens.is_subset(s),
            (Self::Set(a), Self::Set(b)) => a.is_subset(b),
        }
    }

    fn to_pattern(&self) -> PatternSlot {
        match self {
            Self::Any => PatternSlot::Any,
            Self::Set(s) => PatternSlot::Tokens(s.iter().map(|t| t.to_string()).collect()),
        }
    }
}

fn row<'a>(
    rule: &'a TransliterationRule,
    by_class: &BTreeMap<&'a str, BTreeSet<&'a str>>,
    max_prev: usize,
    width: usize,
) -> Vec<Slot<'a>> {
    let classes = |c: &'a Option<Vec<String>>| {
        c.iter()
            .flatten()
            .map(move |class| Slot::class(by_class, class))
    };
    let tokens = |t: &'a Option<Vec<String>>| t.iter().flatten().map(|token| Slot::single(token));

    let mut row = vec![Slot::Any; max_prev - rule.prev_count()];
    row.extend(classes(&rule.prev_classes));
    row.extend(tokens(&rule.prev_tokens));
    row.extend(rule.tokens.iter().map(|token| Slot::single(token)));
    row.extend(tokens(&rule.next_tokens));
    row.extend(classes(&rule.next_classes));
    row.resize(width, Slot::Any);
    row
}

fn full_intersection<'a>(a: &[Slot<'a>], b: &[Slot<'a>]) -> Option<Vec<Slot<'a>>> {
    a.iter().zip(b).map(|(x, y)| x.intersect(y)).collect()
}

/// Columns of `pattern` that hold a token whenever it matches at a
/// transliteration position.
///
/// Matching starts after the leading boundary and before the trailing one,
/// so the columns on either side of the first matched token always exist,
/// as does every column between two required tokens.
fn present_columns(pattern: &[Slot<'_>], first_matched: usize) -> Range<usize> {
    let required = |slot: &Slot<'_>| matches!(slot, Slot::Set(_));
    let lo = pattern
        .iter()
        .position(required)
        .unwrap_or(first_matched)
        .min(first_matched.saturating_sub(1));
    let hi = pattern
        .iter()
        .rposition(required)
        .unwrap_or(first_matched)
        .max(first_matched + 1);
    lo..hi + 1
}

// ---------------------------------------------------------------------------
// Checking
// ---------------------------------------------------------------------------

/// Find every pair of ambiguous rules.
///
/// Each report is also logged as a warning. The analysis does not depend on
/// any input string.
pub fn check(rules: &RuleSet, vocabulary: &TokenVocabulary) -> Vec<AmbiguityReport> {
    let mut reports = Vec::new();
    if rules.is_empty() {
        return reports;
    }

    let by_class = vocabulary.tokens_by_class();
    let all_tokens: BTreeSet<&str> = vocabulary.tokens().collect();
    let max_prev = rules.iter().map(TransliterationRule::prev_count).max().unwrap_or(0);
    let max_curr_next = rules
        .iter()
        .map(TransliterationRule::curr_and_next_count)
        .max()
        .unwrap_or(0);
    let width = max_prev + max_curr_next;
    let matrix: Vec<Vec<Slot<'_>>> = rules
        .iter()
        .map(|rule| row(rule, &by_class, max_prev, width))
        .collect();

    let mut group_start = 0;
    while group_start < rules.len() {
        let mut group_end = group_start + 1;
        while group_end < rules.len() && rules.cmp_cost(group_start, group_end).is_eq() {
            group_end += 1;
        }

        for i in group_start..group_end {
            for j in i + 1..group_end {
                let Some(intersection) = full_intersection(&matrix[i], &matrix[j]) else {
                    continue;
                };
                // Rules before the group are strictly cheaper.
                let present = present_columns(&intersection, max_prev);
                let shadowed = matrix[..group_start].iter().any(|cheaper| {
                    intersection
                        .iter()
                        .zip(cheaper)
                        .enumerate()
                        .all(|(col, (slot, by))| {
                            slot.covered_by(by, &all_tokens, present.contains(&col))
                        })
                });
                if shadowed {
                    continue;
                }
                let report = AmbiguityReport {
                    first: i,
                    second: j,
                    first_rule: rules[i].to_string(),
                    second_rule: rules[j].to_string(),
                    pattern: intersection.iter().map(Slot::to_pattern).collect(),
                };
                log::warn!("{report}");
                reports.push(report);
            }
        }
        group_start = group_end;
    }
    reports
}

/// Fail with every ambiguous pair if the rule set has any.
pub fn ensure_unambiguous(
    rules: &RuleSet,
    vocabulary: &TokenVocabulary,
) -> Result<(), AmbiguousRulesError> {
    let pairs = check(rules, vocabulary);
    if pairs.is_empty() {
        Ok(())
    } else {
        Err(AmbiguousRulesError { pairs })
    }
}
