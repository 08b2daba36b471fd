//! s/t flow network solved with Dinic's algorithm.
//!
//! Nodes `0..n` are pixels, the two terminals are appended after them. Every
//! edge is stored next to its reverse so `e ^ 1` is always the residual twin.

use std::collections::VecDeque;

const NONE: usize = usize::MAX;
const EPS: f64 = 1e-9;

pub struct FlowGraph {
    source: usize,
    sink: usize,
    first: Vec<usize>,
    next: Vec<usize>,
    to: Vec<usize>,
    capacity: Vec<f64>,
    level: Vec<usize>,
    cursor: Vec<usize>,
    offset: f64,
}

impl FlowGraph {
    /// Graph with `nodes` non-terminal nodes and room reserved for `edges` edge pairs
    pub fn new(nodes: usize, edges: usize) -> Self {
        let total = nodes + 2;
        Self {
            source: nodes,
            sink: nodes + 1,
            first: vec![NONE; total],
            next: Vec::with_capacity(edges * 2),
            to: Vec::with_capacity(edges * 2),
            capacity: Vec::with_capacity(edges * 2),
            level: vec![NONE; total],
            cursor: vec![NONE; total],
            offset: 0.0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.first.len() - 2
    }

    /// Edge `a -> b` with capacity `forward` and `b -> a` with capacity `backward`
    pub fn add_edge(&mut self, a: usize, b: usize, forward: f64, backward: f64) {
        self.push_arc(a, b, forward);
        self.push_arc(b, a, backward);
    }

    /// Terminal links: `source -> node` and `node -> sink`.
    /// Only the difference reaches the network; the shared part is a constant of every cut.
    pub fn add_terminal_weights(&mut self, node: usize, from_source: f64, to_sink: f64) {
        let shared = from_source.min(to_sink);
        self.offset += shared;
        let (from_source, to_sink) = (from_source - shared, to_sink - shared);
        if from_source > 0.0 {
            self.add_edge(self.source, node, from_source, 0.0);
        }
        if to_sink > 0.0 {
            self.add_edge(node, self.sink, to_sink, 0.0);
        }
    }

    fn push_arc(&mut self, from: usize, to: usize, capacity: f64) {
        let id = self.to.len();
        self.to.push(to);
        self.capacity.push(capacity);
        self.next.push(self.first[from]);
        self.first[from] = id;
    }

    /// Saturate the network and return the minimum cut value
    pub fn max_flow(&mut self) -> f64 {
        let mut flow = self.offset;
        while self.build_levels() {
            self.cursor.copy_from_slice(&self.first);
            loop {
                let pushed = self.augment();
                if pushed <= EPS {
                    break;
                }
                flow += pushed;
            }
        }
        flow
    }

    /// Nodes still reachable from the source in the residual graph
    pub fn source_side(&self) -> Vec<bool> {
        let mut seen = vec![false; self.first.len()];
        let mut queue = VecDeque::from([self.source]);
        seen[self.source] = true;
        while let Some(u) = queue.pop_front() {
            let mut e = self.first[u];
            while e != NONE {
                let v = self.to[e];
                if !seen[v] && self.capacity[e] > EPS {
                    seen[v] = true;
                    queue.push_back(v);
                }
                e = self.next[e];
            }
        }
        seen.truncate(self.node_count());
        seen
    }

    fn build_levels(&mut self) -> bool {
        self.level.fill(NONE);
        self.level[self.source] = 0;
        let mut queue = VecDeque::from([self.source]);
        while let Some(u) = queue.pop_front() {
            let mut e = self.first[u];
            while e != NONE {
                let v = self.to[e];
                if self.level[v] == NONE && self.capacity[e] > EPS {
                    self.level[v] = self.level[u] + 1;
                    queue.push_back(v);
                }
                e = self.next[e];
            }
        }
        self.level[self.sink] != NONE
    }

    /// Find one augmenting path in the level graph and push its bottleneck.
    /// Iterative so that long paths through large images cannot overflow the stack.
    fn augment(&mut self) -> f64 {
        let mut path: Vec<usize> = Vec::new();
        let mut u = self.source;
        loop {
            if u == self.sink {
                let bottleneck = path
                    .iter()
                    .map(|&e| self.capacity[e])
                    .fold(f64::INFINITY, f64::min);
                for &e in &path {
                    self.capacity[e] -= bottleneck;
                    self.capacity[e ^ 1] += bottleneck;
                }
                return bottleneck;
            }

            let mut advanced = false;
            while self.cursor[u] != NONE {
                let e = self.cursor[u];
                let v = self.to[e];
                if self.capacity[e] > EPS && self.level[v] != NONE && self.level[v] == self.level[u] + 1 {
                    path.push(e);
                    u = v;
                    advanced = true;
                    break;
                }
                self.cursor[u] = self.next[e];
            }

            if !advanced {
                // dead end, prune it from this phase
                self.level[u] = NONE;
                match path.pop() {
                    None => return 0.0,
                    Some(e) => {
                        u = self.to[e ^ 1];
                        self.cursor[u] = self.next[e];
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_chain_bottleneck() {
        let mut g = FlowGraph::new(2, 3);
        g.add_terminal_weights(0, 5.0, 0.0);
        g.add_edge(0, 1, 3.0, 0.0);
        g.add_terminal_weights(1, 0.0, 4.0);
        assert!((g.max_flow() - 3.0).abs() < 1e-9);
        assert_eq!(g.source_side(), vec![true, false]);
    }

    #[test]
    fn test_flow_matches_min_cut() {
        let mut g = FlowGraph::new(4, 8);
        g.add_terminal_weights(0, 10.0, 0.0);
        g.add_terminal_weights(1, 10.0, 0.0);
        g.add_edge(0, 1, 2.0, 0.0);
        g.add_edge(0, 2, 4.0, 0.0);
        g.add_edge(0, 3, 8.0, 0.0);
        g.add_edge(1, 3, 9.0, 0.0);
        g.add_edge(3, 2, 6.0, 0.0);
        g.add_terminal_weights(2, 0.0, 10.0);
        g.add_terminal_weights(3, 0.0, 10.0);
        // min cut is {s, 1}: s->0 plus 1->3
        assert!((g.max_flow() - 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_terminal_weights_keep_their_difference() {
        let mut g = FlowGraph::new(1, 1);
        g.add_terminal_weights(0, -6.0, -4.0);
        // cheaper to cut the source link, so the node ends on the sink side
        assert!((g.max_flow() + 6.0).abs() < 1e-9);
        assert_eq!(g.source_side(), vec![false]);
    }

    #[test]
    fn test_isolated_nodes_stay_on_sink_side() {
        let mut g = FlowGraph::new(3, 1);
        g.add_terminal_weights(0, 1.0, 1.0);
        assert!((g.max_flow() - 1.0).abs() < 1e-9);
        let side = g.source_side();
        assert_eq!(side, vec![false, false, false]);
    }
}
