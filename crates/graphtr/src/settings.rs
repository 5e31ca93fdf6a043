// Transliterator settings and construction options
//
// `Settings` is the serde-facing form of a transliterator: declared tokens,
// rules, on-match rules, whitespace handling and free-form metadata. It is
// what a configuration layer deserializes before handing it to
// `Transliterator::from_settings`.

use std::collections::BTreeMap;

use graphtr_core::error::InvalidRuleSetError;
use graphtr_core::rule::{OnMatchRule, RuleSet, TransliterationRule};
use graphtr_core::token::{TokenVocabulary, WhitespaceConfig};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Construction options for a [`Transliterator`](crate::Transliterator).
///
/// Missing fields deserialize to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransliteratorOptions {
    /// Check that rules and settings only reference declared tokens and
    /// classes.
    pub check_settings: bool,
    /// Reject rule sets containing ambiguous rule pairs.
    pub check_ambiguity: bool,
    /// Skip unrecognizable characters and unmatched tokens instead of
    /// failing the call.
    pub ignore_errors: bool,
}

impl Default for TransliteratorOptions {
    fn default() -> Self {
        Self {
            check_settings: true,
            check_ambiguity: true,
            ignore_errors: false,
        }
    }
}

// ---------------------------------------------------------------------------
// RuleSpec
// ---------------------------------------------------------------------------

/// A rule as written in settings. The cost is computed from the context
/// unless given explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub production: String,
    pub tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_classes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_tokens: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_tokens: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_classes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl RuleSpec {
    /// Convert to a rule, computing its cost when none is given.
    pub fn to_rule(&self) -> TransliterationRule {
        let context = |items: &Option<Vec<String>>| items.clone().unwrap_or_default();
        let rule = TransliterationRule::new(self.tokens.iter().cloned(), self.production.clone())
            .with_prev_classes(context(&self.prev_classes))
            .with_prev_tokens(context(&self.prev_tokens))
            .with_next_tokens(context(&self.next_tokens))
            .with_next_classes(context(&self.next_classes));
        match self.cost {
            Some(cost) => rule.with_cost(cost),
            None => rule,
        }
    }
}

impl From<&TransliterationRule> for RuleSpec {
    fn from(rule: &TransliterationRule) -> Self {
        Self {
            production: rule.production.clone(),
            tokens: rule.tokens.clone(),
            prev_classes: rule.prev_classes.clone(),
            prev_tokens: rule.prev_tokens.clone(),
            next_tokens: rule.next_tokens.clone(),
            next_classes: rule.next_classes.clone(),
            cost: (rule.cost != rule.computed_cost()).then_some(rule.cost),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Complete description of a transliterator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub tokens: TokenVocabulary,
    pub rules: Vec<RuleSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub onmatch_rules: Vec<OnMatchRule>,
    pub whitespace: WhitespaceConfig,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Settings {
    /// Rules in declaration order.
    pub fn transliteration_rules(&self) -> Vec<TransliterationRule> {
        self.rules.iter().map(RuleSpec::to_rule).collect()
    }

    /// Validated, cost-sorted rule set.
    pub fn rule_set(&self) -> Result<RuleSet, InvalidRuleSetError> {
        RuleSet::new(self.transliteration_rules())
    }

    /// Check structure and cross references.
    ///
    /// Rule indices in errors follow declaration order.
    pub fn validate(&self) -> Result<(), InvalidRuleSetError> {
        let rules = self.transliteration_rules();
        RuleSet::new(rules.clone())?;
        for (i, rule) in self.onmatch_rules.iter().enumerate() {
            rule.validate(i)?;
        }
        check_references(&self.tokens, &rules, &self.onmatch_rules, &self.whitespace)
    }
}

/// Check that every token and class referenced by rules, on-match rules and
/// the whitespace configuration is declared in `vocabulary`.
pub fn check_references<'r>(
    vocabulary: &TokenVocabulary,
    rules: impl IntoIterator<Item = &'r TransliterationRule>,
    onmatch_rules: &[OnMatchRule],
    whitespace: &WhitespaceConfig,
) -> Result<(), InvalidRuleSetError> {
    let check_tokens = |tokens: &[String], location: &dyn Fn() -> String| {
        match tokens.iter().find(|t| !vocabulary.contains(t)) {
            Some(token) => Err(InvalidRuleSetError::UnknownToken {
                token: token.clone(),
                location: location(),
            }),
            None => Ok(()),
        }
    };
    let check_classes = |classes: &[String], location: &dyn Fn() -> String| {
        match classes.iter().find(|c| !vocabulary.has_declared_class(c)) {
            Some(class) => Err(InvalidRuleSetError::UnknownClass {
                class: class.clone(),
                location: location(),
            }),
            None => Ok(()),
        }
    };

    check_tokens(std::slice::from_ref(&whitespace.default_token), &|| {
        "whitespace default token".to_string()
    })?;
    check_classes(std::slice::from_ref(&whitespace.token_class), &|| {
        "whitespace token class".to_string()
    })?;

    for (i, rule) in rules.into_iter().enumerate() {
        let none: &[String] = &[];
        check_tokens(&rule.tokens, &|| format!("tokens of rule {i}"))?;
        check_tokens(
            rule.prev_tokens.as_deref().unwrap_or(none),
            &|| format!("prev_tokens of rule {i}"),
        )?;
        check_tokens(
            rule.next_tokens.as_deref().unwrap_or(none),
            &|| format!("next_tokens of rule {i}"),
        )?;
        check_classes(
            rule.prev_classes.as_deref().unwrap_or(none),
            &|| format!("prev_classes of rule {i}"),
        )?;
        check_classes(
            rule.next_classes.as_deref().unwrap_or(none),
            &|| format!("next_classes of rule {i}"),
        )?;
    }

    for (i, rule) in onmatch_rules.iter().enumerate() {
        check_classes(&rule.prev_classes, &|| format!("prev_classes of on-match rule {i}"))?;
        check_classes(&rule.next_classes, &|| format!("next_classes of on-match rule {i}"))?;
    }
    Ok(())
}
