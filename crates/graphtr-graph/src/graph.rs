// Rule graph: a prefix tree over rule token sequences with rule leaves
//
// Nodes and edges live in arenas addressed by index. Every non-start node
// has exactly one incoming edge, and edge `i` always leads into node `i + 1`.

use graphtr_core::rule::{RuleSet, TransliterationRule};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// A node of the rule graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// The root. Always node 0.
    Start,
    /// One step along a rule's token sequence.
    Token { token: String },
    /// A leaf standing for the rule at this index of the [`RuleSet`].
    Rule { rule: usize },
}

/// Lookbehind and lookahead requirements checked on the edge into a rule
/// leaf. Empty requirements are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    pub prev_classes: Option<Vec<String>>,
    pub prev_tokens: Option<Vec<String>>,
    pub next_tokens: Option<Vec<String>>,
    pub next_classes: Option<Vec<String>>,
}

impl Constraints {
    /// Lookaround requirements of `rule`, or `None` when it has none.
    pub fn of(rule: &TransliterationRule) -> Option<Self> {
        if !rule.has_constraints() {
            return None;
        }
        Some(Self {
            prev_classes: rule.prev_classes.clone(),
            prev_tokens: rule.prev_tokens.clone(),
            next_tokens: rule.next_tokens.clone(),
            next_classes: rule.next_classes.clone(),
        })
    }
}

/// A directed edge of the rule graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    /// Required token, set on edges into token nodes.
    pub token: Option<String>,
    /// Lookaround requirements, set on edges into rule leaves.
    pub constraints: Option<Constraints>,
    /// Lowest cost of any rule reachable through this edge.
    pub cost: f64,
}

/// Children of one node, grouped for lookup during matching.
///
/// Rule leaves hang under a single sentinel list sorted by ascending edge
/// cost. Token children are keyed by their token; a tree has at most one
/// child per token, so each entry holds a single node index. Every outgoing
/// edge of the node appears in exactly one of the two groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedChildren {
    rules: Vec<usize>,
    tokens: Vec<(String, usize)>,
}

impl OrderedChildren {
    /// Rule leaves attached directly to the node, cheapest first.
    #[inline]
    pub fn rules(&self) -> &[usize] {
        &self.rules
    }

    /// The token child reached by consuming `token`.
    #[inline]
    pub fn token_child(&self, token: &str) -> Option<usize> {
        self.tokens
            .binary_search_by(|(t, _)| t.as_str().cmp(token))
            .ok()
            .map(|i| self.tokens[i].1)
    }

    /// Token children in ascending token order.
    pub fn token_children(&self) -> impl Iterator<Item = (&str, usize)> {
        self.tokens.iter().map(|(t, n)| (t.as_str(), *n))
    }

    /// Number of children in both groups.
    pub fn len(&self) -> usize {
        self.rules.len() + self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.tokens.is_empty()
    }
}

/// The tree searched by the matcher, built once from a [`RuleSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    children: Vec<OrderedChildren>,
}

impl RuleGraph {
    /// Index of the start node.
    pub const START: usize = 0;

    /// Build the graph for a cost-sorted rule set.
    ///
    /// Each rule's tokens are walked from the root, reusing token nodes
    /// shared with earlier rules, and a rule leaf is attached at the end of
    /// the chain. Lookaround requirements go on the leaf edge rather than
    /// adding depth. Output depends only on the rule order.
    pub fn build(rules: &RuleSet) -> Self {
        let mut graph = Self {
            nodes: vec![Node::Start],
            edges: Vec::new(),
            children: Vec::new(),
        };
        // (parent, token) -> token child
        let mut token_nodes: HashMap<(usize, &str), usize> = HashMap::new();

        for (rule_index, rule) in rules.iter().enumerate() {
            let mut parent = Self::START;
            for token in &rule.tokens {
                let child = match token_nodes.get(&(parent, token.as_str())) {
                    Some(&child) => child,
                    None => {
                        let child = graph.add_node(
                            parent,
                            Node::Token {
                                token: token.clone(),
                            },
                            Some(token.clone()),
                            None,
                            rule.cost,
                        );
                        token_nodes.insert((parent, token.as_str()), child);
                        child
                    }
                };
                let edge = &mut graph.edges[child - 1];
                if rule.cost < edge.cost {
                    edge.cost = rule.cost;
                }
                parent = child;
            }
            graph.add_node(
                parent,
                Node::Rule { rule: rule_index },
                None,
                Constraints::of(rule),
                rule.cost,
            );
        }

        graph.children = graph.order_children();
        log::debug!(
            "built rule graph: {} nodes, {} rule leaves",
            graph.nodes.len(),
            rules.len()
        );
        graph
    }

    fn add_node(
        &mut self,
        parent: usize,
        node: Node,
        token: Option<String>,
        constraints: Option<Constraints>,
        cost: f64,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.edges.push(Edge {
            from: parent,
            to: index,
            token,
            constraints,
            cost,
        });
        index
    }

    /// Group each node's outgoing edges into cost-ordered child lists.
    fn order_children(&self) -> Vec<OrderedChildren> {
        let mut children = vec![OrderedChildren::default(); self.nodes.len()];
        for edge in &self.edges {
            let entry = &mut children[edge.from];
            match &self.nodes[edge.to] {
                Node::Token { token } => entry.tokens.push((token.clone(), edge.to)),
                Node::Rule { .. } => entry.rules.push(edge.to),
                Node::Start => {}
            }
        }
        for entry in &mut children {
            // Stable: equal-cost leaves stay in rule order.
            entry
                .rules
                .sort_by(|&a, &b| self.edges[a - 1].cost.total_cmp(&self.edges[b - 1].cost));
            entry.tokens.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
        children
    }

    /// Node at `index`.
    #[inline]
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The single edge leading into `node`, or `None` for the start node.
    #[inline]
    pub fn edge_into(&self, node: usize) -> Option<&Edge> {
        node.checked_sub(1).and_then(|i| self.edges.get(i))
    }

    /// Cost of the edge leading into `node` (0 for the start node).
    #[inline]
    pub fn cost_into(&self, node: usize) -> f64 {
        self.edge_into(node).map_or(0.0, |e| e.cost)
    }

    /// Cost-ordered children of `node`.
    #[inline]
    pub fn ordered_children(&self, node: usize) -> &OrderedChildren {
        &self.children[node]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph holds no rules.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphtr_core::rule::TransliterationRule;

    fn rule_set(rules: Vec<TransliterationRule>) -> RuleSet {
        RuleSet::new(rules).unwrap()
    }

    #[test]
    fn empty_rule_set_has_only_start() {
        let g = RuleGraph::build(&RuleSet::default());
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.node(RuleGraph::START), &Node::Start);
        assert!(g.is_empty());
        assert!(g.ordered_children(RuleGraph::START).is_empty());
        assert!(g.edge_into(RuleGraph::START).is_none());
    }

    #[test]
    fn shared_prefixes_reuse_token_nodes() {
        let rules = rule_set(vec![
            TransliterationRule::new(["a"], "A"),
            TransliterationRule::new(["a", "a"], "AA"),
            TransliterationRule::new(["a", "b"], "AB"),
        ]);
        let g = RuleGraph::build(&rules);
        // start, a, a-a, rule(aa), a-b, rule(ab), rule(a)
        assert_eq!(g.node_count(), 7);
        assert_eq!(g.edge_count(), 6);

        let root = g.ordered_children(RuleGraph::START);
        assert!(root.rules().is_empty());
        let a = root.token_child("a").unwrap();
        assert_eq!(g.node(a), &Node::Token { token: "a".into() });
        assert!(root.token_child("b").is_none());

        let a_children = g.ordered_children(a);
        assert_eq!(a_children.rules().len(), 1);
        assert!(a_children.token_child("a").is_some());
        assert!(a_children.token_child("b").is_some());
        // edge into `a` carries the cheapest cost below it
        assert_eq!(g.cost_into(a), rules[0].cost);
    }

    #[test]
    fn rule_leaves_are_cost_ordered() {
        let rules = rule_set(vec![
            TransliterationRule::new(["a"], "plain"),
            TransliterationRule::new(["a"], "before b").with_next_tokens(["b"]),
            TransliterationRule::new(["a"], "between")
                .with_prev_tokens(["b"])
                .with_next_tokens(["b"]),
        ]);
        let g = RuleGraph::build(&rules);
        let a = g.ordered_children(RuleGraph::START).token_child("a").unwrap();
        let leaves: Vec<usize> = g
            .ordered_children(a)
            .rules()
            .iter()
            .map(|&n| match g.node(n) {
                Node::Rule { rule } => *rule,
                other => panic!("expected rule leaf, got {other:?}"),
            })
            .collect();
        assert_eq!(leaves, vec![0, 1, 2]);
        let costs: Vec<f64> = g.ordered_children(a).rules().iter().map(|&n| g.cost_into(n)).collect();
        assert!(costs.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn constraints_live_on_leaf_edges() {
        let rules = rule_set(vec![
            TransliterationRule::new(["a"], "A")
                .with_prev_classes(["vowel"])
                .with_next_tokens(["b"]),
        ]);
        let g = RuleGraph::build(&rules);
        let leaf = g.ordered_children(1).rules()[0];
        let edge = g.edge_into(leaf).unwrap();
        assert_eq!(edge.from, 1);
        assert!(edge.token.is_none());
        let c = edge.constraints.as_ref().unwrap();
        assert_eq!(c.prev_classes.as_deref(), Some(&["vowel".to_string()][..]));
        assert_eq!(c.next_tokens.as_deref(), Some(&["b".to_string()][..]));
        assert!(c.prev_tokens.is_none());
        assert_eq!(g.edge_into(1).unwrap().token.as_deref(), Some("a"));
    }

    #[test]
    fn tree_invariants_hold() {
        let rules = rule_set(vec![
            TransliterationRule::new(["a", "b", "c"], "1"),
            TransliterationRule::new(["a", "b"], "2"),
            TransliterationRule::new(["b"], "3").with_prev_classes(["x"]),
            TransliterationRule::new(["c", "a"], "4"),
        ]);
        let g = RuleGraph::build(&rules);
        for (i, edge) in g.edges().iter().enumerate() {
            assert_eq!(edge.to, i + 1);
            assert!(edge.from < edge.to);
            assert!(!matches!(g.node(edge.from), Node::Rule { .. }));
        }
        let listed: usize = (0..g.node_count()).map(|n| g.ordered_children(n).len()).sum();
        assert_eq!(listed, g.edge_count());
        for n in 0..g.node_count() {
            if matches!(g.node(n), Node::Rule { .. }) {
                assert!(g.ordered_children(n).is_empty());
            }
        }
    }

    #[test]
    fn build_is_deterministic() {
        let rules = rule_set(vec![
            TransliterationRule::new(["b"], "B"),
            TransliterationRule::new(["a"], "A"),
            TransliterationRule::new(["a", "b"], "AB"),
            TransliterationRule::new(["a"], "A2").with_next_classes(["c"]),
        ]);
        assert_eq!(RuleGraph::build(&rules), RuleGraph::build(&rules));
    }

    #[test]
    fn graph_round_trips_through_json() {
        let rules = rule_set(vec![
            TransliterationRule::new(["a"], "A").with_prev_tokens(["b"]),
            TransliterationRule::new(["b"], "B"),
        ]);
        let g = RuleGraph::build(&rules);
        let json = serde_json::to_string(&g).unwrap();
        let restored: RuleGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(g, restored);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_rules() -> impl Strategy<Value = Vec<TransliterationRule>> {
            let token = prop::sample::select(vec!["a", "b", "c"]);
            let rule = (
                prop::collection::vec(token.clone(), 1..4),
                prop::option::of(prop::collection::vec(token, 1..3)),
            )
                .prop_map(|(tokens, next)| {
                    let production = tokens.concat();
                    let rule = TransliterationRule::new(tokens, production);
                    match next {
                        Some(next) => rule.with_next_tokens(next),
                        None => rule,
                    }
                });
            prop::collection::vec(rule, 0..12)
        }

        proptest! {
            #[test]
            fn rebuilding_gives_the_same_graph(rules in arb_rules()) {
                let rules = RuleSet::new(rules).unwrap();
                prop_assert_eq!(RuleGraph::build(&rules), RuleGraph::build(&rules));
            }

            #[test]
            fn every_rule_has_one_leaf(rules in arb_rules()) {
                let rules = RuleSet::new(rules).unwrap();
                let g = RuleGraph::build(&rules);
                let mut leaves: Vec<usize> = g
                    .nodes()
                    .iter()
                    .filter_map(|n| match n {
                        Node::Rule { rule } => Some(*rule),
                        _ => None,
                    })
                    .collect();
                leaves.sort_unstable();
                prop_assert_eq!(leaves, (0..rules.len()).collect::<Vec<_>>());
            }
        }
    }
}
