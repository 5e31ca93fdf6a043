// Error types shared by the transliteration crates

/// Errors raised while transliterating a single input.
///
/// These are local to one call: they never leave the engine in a different
/// state, and under an error-ignoring policy they are collected instead of
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransliterationError {
    /// No declared token starts at this character offset of the input.
    #[error("unrecognizable input token {character:?} at position {position}")]
    UnrecognizableToken { position: usize, character: char },

    /// No rule is satisfiable at this index of the boundary-padded token
    /// sequence.
    #[error("no matching transliteration rule at token position {position} ({token:?})")]
    NoMatchingRule { position: usize, token: String },
}

impl TransliterationError {
    /// Position reported by the error (char offset for tokenizer errors,
    /// token index for matcher errors).
    pub fn position(&self) -> usize {
        match self {
            Self::UnrecognizableToken { position, .. } | Self::NoMatchingRule { position, .. } => {
                *position
            }
        }
    }
}

/// Errors describing a malformed rule set or configuration.
///
/// These indicate an integration problem with whatever produced the rules,
/// and are always fatal to construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidRuleSetError {
    /// A rule must match at least one token.
    #[error("rule {rule} producing {production:?} has no tokens")]
    EmptyTokens { rule: usize, production: String },

    /// Costs must be finite and lie strictly between 0 and 1.
    #[error("rule {rule} has invalid cost {cost}")]
    InvalidCost { rule: usize, cost: f64 },

    /// On-match rules need at least one previous and one next class.
    #[error("on-match rule {rule} producing {production:?} has an empty {field}")]
    EmptyOnMatchClasses {
        rule: usize,
        production: String,
        field: &'static str,
    },

    /// A rule or setting references a token missing from the vocabulary.
    #[error("invalid token {token:?} in {location}")]
    UnknownToken { token: String, location: String },

    /// A rule or setting references a class no token carries.
    #[error("invalid token class {class:?} in {location}")]
    UnknownClass { class: String, location: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliteration_error_position() {
        let e = TransliterationError::UnrecognizableToken {
            position: 3,
            character: 'x',
        };
        assert_eq!(e.position(), 3);
        let e = TransliterationError::NoMatchingRule {
            position: 7,
            token: "b".into(),
        };
        assert_eq!(e.position(), 7);
    }

    #[test]
    fn error_messages() {
        let e = TransliterationError::UnrecognizableToken {
            position: 1,
            character: 'z',
        };
        assert_eq!(e.to_string(), "unrecognizable input token 'z' at position 1");

        let e = InvalidRuleSetError::UnknownClass {
            class: "nasal".into(),
            location: "prev_classes of rule 2".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid token class \"nasal\" in prev_classes of rule 2"
        );
    }
}
