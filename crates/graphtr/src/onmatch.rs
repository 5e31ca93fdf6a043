// On-match engine: output inserted between successive matches
//
// Rules are indexed by the pair (current token, previous token) derived from
// the first next-class and the last previous-class of each rule. Index
// entries keep declaration order so the first fitting rule wins.

use graphtr_core::rule::OnMatchRule;
use graphtr_core::token::TokenVocabulary;
use hashbrown::HashMap;

/// Ordered on-match rules with a token-pair lookup index.
#[derive(Debug, Clone, Default)]
pub struct OnMatchEngine {
    rules: Vec<OnMatchRule>,
    // current token -> previous token -> rule indices, ascending
    lookup: HashMap<String, HashMap<String, Vec<usize>>>,
}

impl OnMatchEngine {
    pub fn new(rules: Vec<OnMatchRule>, vocabulary: &TokenVocabulary) -> Self {
        let mut lookup: HashMap<String, HashMap<String, Vec<usize>>> = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            let (Some(prev_class), Some(next_class)) =
                (rule.prev_classes.last(), rule.next_classes.first())
            else {
                continue;
            };
            let prev_tokens = vocabulary.tokens_of_class(prev_class);
            for current in vocabulary.tokens_of_class(next_class) {
                let by_prev = lookup.entry(current.to_string()).or_default();
                for prev in &prev_tokens {
                    by_prev.entry(prev.to_string()).or_default().push(i);
                }
            }
        }
        Self { rules, lookup }
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[OnMatchRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Production to insert before a match starting at `position`, if an
    /// on-match rule fits the classes around it.
    ///
    /// Previous classes must end at `position - 1`; next classes must start
    /// at `position`.
    pub fn production_at<S: AsRef<str>>(
        &self,
        tokens: &[S],
        position: usize,
        vocabulary: &TokenVocabulary,
    ) -> Option<&str> {
        if self.rules.is_empty() || position == 0 || position >= tokens.len() {
            return None;
        }
        let current = tokens[position].as_ref();
        let prev = tokens[position - 1].as_ref();
        let candidates = self.lookup.get(current)?.get(prev)?;

        let fits = |window: &[S], classes: &[String]| {
            window
                .iter()
                .zip(classes)
                .all(|(token, class)| vocabulary.has_class(token.as_ref(), class))
        };

        candidates.iter().map(|&i| &self.rules[i]).find_map(|rule| {
            let from = position.checked_sub(rule.prev_classes.len())?;
            let to = position + rule.next_classes.len();
            if to > tokens.len()
                || !fits(&tokens[from..position], &rule.prev_classes)
                || !fits(&tokens[position..to], &rule.next_classes)
            {
                return None;
            }
            log::trace!("on-match rule inserts {:?} at token {}", rule.production, position);
            Some(rule.production.as_str())
        })
    }
}
