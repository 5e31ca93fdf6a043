// Tokenizer: longest-match segmentation of raw input into declared tokens
//
// Declared tokens are stored in a character trie. At each position the
// deepest terminal reached along the input wins, so the longest declared
// token is always chosen and two candidates of equal length cannot exist.
// Positions reported in errors are char offsets into the input.

use graphtr_core::error::TransliterationError;
use graphtr_core::token::{TokenVocabulary, WhitespaceConfig};
use hashbrown::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: HashMap<char, usize>,
    /// Declared token ending at this node.
    token: Option<String>,
}

/// Segments input strings into the tokens of one vocabulary.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    nodes: Vec<TrieNode>,
    whitespace: WhitespaceConfig,
    whitespace_tokens: HashSet<String>,
}

impl Tokenizer {
    /// Build the trie for every token of `vocabulary`.
    pub fn new(vocabulary: &TokenVocabulary, whitespace: WhitespaceConfig) -> Self {
        let mut nodes = vec![TrieNode::default()];
        for token in vocabulary.tokens() {
            let mut current = 0;
            for c in token.chars() {
                current = match nodes[current].children.get(&c) {
                    Some(&next) => next,
                    None => {
                        let next = nodes.len();
                        nodes.push(TrieNode::default());
                        nodes[current].children.insert(c, next);
                        next
                    }
                };
            }
            // The empty string never segments anything.
            if current != 0 {
                nodes[current].token = Some(token.to_string());
            }
        }

        let whitespace_tokens = vocabulary
            .tokens()
            .filter(|t| whitespace.is_whitespace(vocabulary, t))
            .map(str::to_string)
            .collect();

        Self {
            nodes,
            whitespace,
            whitespace_tokens,
        }
    }

    pub fn whitespace(&self) -> &WhitespaceConfig {
        &self.whitespace
    }

    /// Whether `token` carries the whitespace class.
    #[inline]
    pub fn is_whitespace(&self, token: &str) -> bool {
        self.whitespace_tokens.contains(token)
    }

    /// Walk the trie from `chars[position]`, yielding each declared token
    /// passed on the way with its length in chars.
    fn prefixes<'s>(
        &'s self,
        chars: &[char],
        position: usize,
    ) -> impl Iterator<Item = (&'s str, usize)> {
        let mut current = Some(0);
        chars
            .get(position..)
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map_while(move |(i, c)| {
                let next = *self.nodes[current?].children.get(c)?;
                current = Some(next);
                Some((self.nodes[next].token.as_deref(), i + 1))
            })
            .filter_map(|(token, len)| token.map(|t| (t, len)))
    }

    /// Longest declared token starting at `position`.
    fn longest_at<'s>(&'s self, chars: &[char], position: usize) -> Option<(&'s str, usize)> {
        self.prefixes(chars, position).last()
    }

    /// Every declared token that starts at char offset `position` of
    /// `input`, longest first.
    pub fn tokens_at<'s>(&'s self, input: &str, position: usize) -> Vec<&'s str> {
        let chars: Vec<char> = input.chars().collect();
        let mut found: Vec<&'s str> = self
            .prefixes(&chars, position)
            .map(|(token, _)| token)
            .collect();
        found.reverse();
        found
    }

    /// Segment `input`, failing at the first character no token covers.
    ///
    /// The result always starts and ends with the default whitespace token.
    pub fn tokenize(&self, input: &str) -> Result<Vec<String>, TransliterationError> {
        self.segment(input, None)
    }

    /// Segment `input`, skipping characters no token covers.
    ///
    /// Each skipped character is logged and appended to `errors`.
    pub fn tokenize_skipping(&self, input: &str, errors: &mut Vec<TransliterationError>) -> Vec<String> {
        // Segmenting never fails once errors are collected.
        self.segment(input, Some(errors)).unwrap_or_default()
    }

    fn segment(
        &self,
        input: &str,
        mut errors: Option<&mut Vec<TransliterationError>>,
    ) -> Result<Vec<String>, TransliterationError> {
        let chars: Vec<char> = input.chars().collect();
        let mut raw: Vec<&str> = Vec::new();
        let mut position = 0;

        while position < chars.len() {
            match self.longest_at(&chars, position) {
                Some((token, len)) => {
                    raw.push(token);
                    position += len;
                }
                None => {
                    let error = TransliterationError::UnrecognizableToken {
                        position,
                        character: chars[position],
                    };
                    log::warn!("{error} in {input:?}");
                    match errors.as_deref_mut() {
                        Some(errors) => {
                            errors.push(error);
                            position += 1;
                        }
                        None => return Err(error),
                    }
                }
            }
        }

        Ok(self.pad(raw))
    }

    /// Add the boundary tokens and apply whitespace consolidation.
    fn pad(&self, raw: Vec<&str>) -> Vec<String> {
        let boundary = &self.whitespace.default_token;
        let mut tokens = Vec::with_capacity(raw.len() + 2);
        tokens.push(boundary.clone());

        if self.whitespace.consolidate {
            let mut pending_whitespace = false;
            for token in raw {
                if self.is_whitespace(token) {
                    pending_whitespace = true;
                    continue;
                }
                // Runs before the first token are dropped, as are trailing
                // runs since nothing follows to flush them.
                if pending_whitespace && tokens.len() > 1 {
                    tokens.push(boundary.clone());
                }
                pending_whitespace = false;
                tokens.push(token.to_string());
            }
        } else {
            tokens.extend(raw.into_iter().map(str::to_string));
        }

        tokens.push(boundary.clone());
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vocabulary() -> TokenVocabulary {
        [
            ("a", vec!["vowel"]),
            ("aa", vec!["vowel"]),
            ("aab", vec![]),
            ("b", vec![]),
            (" ", vec!["wb"]),
            ("\t", vec!["wb"]),
            ("é", vec!["vowel"]),
        ]
        .into_iter()
        .collect()
    }

    fn tokenizer(consolidate: bool) -> Tokenizer {
        Tokenizer::new(&vocabulary(), WhitespaceConfig::new(" ", "wb", consolidate))
    }

    #[test]
    fn longest_match_wins() {
        let t = tokenizer(true);
        assert_eq!(t.tokenize("aabaaa").unwrap(), vec![" ", "aab", "aa", "a", " "]);
        assert_eq!(t.tokenize("aaa").unwrap(), vec![" ", "aa", "a", " "]);
    }

    #[test]
    fn empty_input_is_two_boundaries() {
        let t = tokenizer(true);
        assert_eq!(t.tokenize("").unwrap(), vec![" ", " "]);
        assert_eq!(tokenizer(false).tokenize("").unwrap(), vec![" ", " "]);
    }

    #[test]
    fn consolidation_collapses_interior_runs() {
        let t = tokenizer(true);
        assert_eq!(t.tokenize("a \t b").unwrap(), vec![" ", "a", " ", "b", " "]);
        assert_eq!(t.tokenize("\ta\t").unwrap(), vec![" ", "a", " "]);
        assert_eq!(t.tokenize("   ").unwrap(), vec![" ", " "]);
    }

    #[test]
    fn no_consolidation_keeps_every_token() {
        let t = tokenizer(false);
        assert_eq!(
            t.tokenize(" a\t").unwrap(),
            vec![" ", " ", "a", "\t", " "]
        );
    }

    #[test]
    fn unrecognizable_token_position_is_char_offset() {
        let t = tokenizer(true);
        let err = t.tokenize("éax").unwrap_err();
        assert_eq!(
            err,
            TransliterationError::UnrecognizableToken {
                position: 2,
                character: 'x'
            }
        );
    }

    #[test]
    fn skipping_records_errors() {
        let t = tokenizer(true);
        let mut errors = Vec::new();
        let tokens = t.tokenize_skipping("axbx", &mut errors);
        assert_eq!(tokens, vec![" ", "a", "b", " "]);
        let positions: Vec<usize> = errors.iter().map(TransliterationError::position).collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[test]
    fn tokens_at_lists_longest_first() {
        let t = tokenizer(true);
        assert_eq!(t.tokens_at("baab", 1), vec!["aab", "aa", "a"]);
        assert_eq!(t.tokens_at("baab", 0), vec!["b"]);
        assert!(t.tokens_at("baab", 9).is_empty());
        assert!(t.tokens_at("x", 0).is_empty());
    }

    #[test]
    fn whitespace_tokens_follow_class() {
        let t = tokenizer(true);
        assert!(t.is_whitespace(" "));
        assert!(t.is_whitespace("\t"));
        assert!(!t.is_whitespace("a"));
    }

    proptest! {
        #[test]
        fn segmentation_reassembles_input(input in "[ab \t]{0,24}") {
            let t = tokenizer(false);
            let tokens = t.tokenize(&input).unwrap();
            prop_assert_eq!(tokens.first().map(String::as_str), Some(" "));
            prop_assert_eq!(tokens.last().map(String::as_str), Some(" "));
            let inner = tokens[1..tokens.len() - 1].concat();
            prop_assert_eq!(inner, input);
        }

        #[test]
        fn each_token_is_the_longest_candidate(input in "[ab]{1,16}") {
            let t = tokenizer(true);
            let tokens = t.tokenize(&input).unwrap();
            let mut offset = 0;
            for token in &tokens[1..tokens.len() - 1] {
                let candidates = t.tokens_at(&input, offset);
                prop_assert_eq!(candidates.first().copied(), Some(token.as_str()));
                offset += token.chars().count();
            }
        }
    }
}
