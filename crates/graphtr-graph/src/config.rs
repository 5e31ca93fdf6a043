// Match configuration / search stack
//
// The matcher keeps its depth-first search state here instead of on the call
// stack. One configuration is reused across every position of a
// transliteration so the stack allocation is paid once per input.

/// One pending step of the search: a graph node reached at a token position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Graph node index.
    pub node: usize,
    /// Index of the next unconsumed token. For a rule leaf this is the end
    /// of the matched tokens.
    pub position: usize,
    /// Cost of the edge that led here.
    pub cost: f64,
}

/// Reusable search state for [`Matcher`](crate::matcher::Matcher).
#[derive(Debug, Clone, Default)]
pub struct MatchConfig {
    /// Pending frames; the top is explored next.
    pub stack: Vec<Frame>,
    /// Satisfiable rule indices found so far.
    pub matches: Vec<usize>,
    /// Cost of the cheapest satisfiable rule found so far.
    pub best_cost: f64,
}

impl MatchConfig {
    /// Create a configuration with room for `capacity` pending frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            stack: Vec::with_capacity(capacity),
            matches: Vec::new(),
            best_cost: f64::INFINITY,
        }
    }

    /// Clear the search state before matching at a new position.
    #[inline]
    pub fn reset(&mut self) {
        self.stack.clear();
        self.matches.clear();
        self.best_cost = f64::INFINITY;
    }

    /// Record a satisfiable rule.
    #[inline]
    pub fn record(&mut self, rule: usize, cost: f64) {
        self.matches.push(rule);
        if cost < self.best_cost {
            self.best_cost = cost;
        }
    }

    /// Lowest recorded rule index.
    #[inline]
    pub fn best(&self) -> Option<usize> {
        self.matches.iter().copied().min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_creation() {
        let config = MatchConfig::new(16);
        assert!(config.stack.is_empty());
        assert!(config.stack.capacity() >= 16);
        assert!(config.matches.is_empty());
        assert!(config.best_cost.is_infinite());
        assert_eq!(config.best(), None);
    }

    #[test]
    fn config_record_tracks_best() {
        let mut config = MatchConfig::new(4);
        config.record(5, 0.5);
        config.record(2, 0.3);
        config.record(7, 0.6);
        assert_eq!(config.best(), Some(2));
        assert_eq!(config.best_cost, 0.3);
        assert_eq!(config.matches, vec![5, 2, 7]);
    }

    #[test]
    fn config_reset() {
        let mut config = MatchConfig::new(4);
        config.stack.push(Frame {
            node: 3,
            position: 1,
            cost: 0.5,
        });
        config.record(1, 0.2);

        config.reset();

        assert!(config.stack.is_empty());
        assert!(config.matches.is_empty());
        assert!(config.best_cost.is_infinite());
    }
}
