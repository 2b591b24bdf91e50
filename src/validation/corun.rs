//! Co-run dependency graph.
//!
//! Each co-run rule `[t0, t1, ..., tn]` declares that every task requires
//! the next one in its list: edges `t0 → t1 → ... → tn`. A task that
//! transitively requires itself makes the rule set unsatisfiable.
//!
//! Nodes are indexed by first appearance, so traversal order (and therefore
//! the reported cycles) is deterministic.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.3

use std::collections::HashMap;

use crate::models::{BusinessRule, RuleKind};

#[derive(Debug, Clone, Copy)]
struct Edge {
    to: usize,
    rule: usize,
}

/// A node on the DFS path: the rule whose edge entered it and the next
/// outgoing edge to explore.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: usize,
    entered_by: Option<usize>,
    next_edge: usize,
}

impl Frame {
    fn new(node: usize, entered_by: Option<usize>) -> Self {
        Self {
            node,
            entered_by,
            next_edge: 0,
        }
    }
}

/// A cycle in the co-run graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoRunCycle {
    /// Task IDs along the cycle; the first is repeated at the end.
    pub tasks: Vec<String>,
    /// Rules contributing edges to the cycle, in traversal order.
    pub rule_ids: Vec<String>,
}

/// Directed graph over co-run task groups.
#[derive(Debug, Clone, Default)]
pub struct CoRunGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    adj: Vec<Vec<Edge>>,
    rule_ids: Vec<String>,
}

impl CoRunGraph {
    /// Builds the graph from the co-run rules among `rules`.
    pub fn from_rules<'r>(rules: impl IntoIterator<Item = &'r BusinessRule>) -> Self {
        let mut graph = Self::default();
        for rule in rules {
            if let RuleKind::CoRun { tasks } = &rule.kind {
                let rule_idx = graph.rule_ids.len();
                graph.rule_ids.push(rule.id.clone());
                let ids: Vec<usize> = tasks.iter().map(|t| graph.node(t)).collect();
                for pair in ids.windows(2) {
                    graph.adj[pair[0]].push(Edge {
                        to: pair[1],
                        rule: rule_idx,
                    });
                }
            }
        }
        graph
    }

    /// Number of distinct tasks.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.adj.iter().map(Vec::len).sum()
    }

    /// Finds cycles with a DFS, one per back edge.
    ///
    /// The traversal keeps its own path stack, so chain length is bounded
    /// by memory rather than by the call stack.
    pub fn cycles(&self) -> Vec<CoRunCycle> {
        let n = self.nodes.len();
        let mut visited = vec![false; n];
        // position of each node on the current path
        let mut depth: Vec<Option<usize>> = vec![None; n];
        let mut path: Vec<Frame> = Vec::new();
        let mut cycles = Vec::new();

        for root in 0..n {
            if visited[root] {
                continue;
            }
            visited[root] = true;
            depth[root] = Some(0);
            path.push(Frame::new(root, None));

            while let Some(frame) = path.last_mut() {
                let node = frame.node;
                let Some(&edge) = self.adj[node].get(frame.next_edge) else {
                    depth[node] = None;
                    path.pop();
                    continue;
                };
                frame.next_edge += 1;

                if let Some(start) = depth[edge.to] {
                    // back edge
                    cycles.push(self.cycle_from(&path[start..], edge));
                } else if !visited[edge.to] {
                    visited[edge.to] = true;
                    depth[edge.to] = Some(path.len());
                    path.push(Frame::new(edge.to, Some(edge.rule)));
                }
            }
        }
        cycles
    }

    /// Whether any task transitively requires itself.
    pub fn has_cycle(&self) -> bool {
        !self.cycles().is_empty()
    }

    fn node(&mut self, task_id: &str) -> usize {
        if let Some(&i) = self.index.get(task_id) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(task_id.to_string());
        self.index.insert(task_id.to_string(), i);
        self.adj.push(Vec::new());
        i
    }

    fn cycle_from(&self, path: &[Frame], closing: Edge) -> CoRunCycle {
        let mut tasks: Vec<String> = path.iter().map(|f| self.nodes[f.node].clone()).collect();
        tasks.push(self.nodes[closing.to].clone());

        let mut rule_ids: Vec<String> = Vec::new();
        let entering = path.iter().skip(1).filter_map(|f| f.entered_by);
        for rule in entering.chain(std::iter::once(closing.rule)) {
            let id = &self.rule_ids[rule];
            if !rule_ids.contains(id) {
                rule_ids.push(id.clone());
            }
        }

        CoRunCycle { tasks, rule_ids }
    }
}
