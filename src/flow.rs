//! Module for vertex-capacitated flows between a set of sources and a set of targets in a
//! `UGraph`.
//!
//! Every vertex `v` is split into an in-port `v'` and an out-port `v''` joined by an arc of
//! capacity 1, and every edge `{v,w}` gives the arcs `(v'',w')` and `(w'',v')`. A flow of value
//! `k` is therefore a set of `k` vertex-disjoint paths from sources to targets. Sources are never
//! entered and targets never left, so each path starts at a source, ends at a target and has only
//! non-terminal vertices in between. This does not change the maximum flow: any path through
//! another terminal can be cut short at it.
//!
//! Flow is stored as links: `go_to[v]` is the vertex `v` sends its unit to and `come_from[v]` the
//! vertex it receives it from. A source on a path has only `go_to`, a target only `come_from`.
//! Residual searches run over the ports in BFS order and are O(|V| + |E|); draining a single
//! path only walks that path.

use std::collections::VecDeque;
use crate::bitset::BitSet;
use crate::graph::UGraph;

const IN: usize = 0;
const OUT: usize = 1;

/// Returns the id of `port` of `node`.
fn port(node: usize, port: usize) -> usize {
    node << 1 | port
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FlowNet {
    go_to: Vec<Option<usize>>,
    come_from: Vec<Option<usize>>,
    /// Number of completed source-target paths.
    flow: usize,
    /// Predecessor port of each port reached by the last search. Roots point to themselves.
    pred: Vec<usize>,
    /// Ports reached by the last search.
    seen: BitSet,
    queue: VecDeque<usize>,
}

impl FlowNet {

    /// Creates an empty flow for graphs with `size` reserved ids. All scratch space is allocated
    /// here.
    pub fn new(size: usize) -> Self {
        FlowNet {
            go_to: vec![None; size],
            come_from: vec![None; size],
            flow: 0,
            pred: vec![0; 2 * size],
            seen: BitSet::new(2 * size),
            queue: VecDeque::with_capacity(2 * size),
        }
    }

    /// Removes all flow.
    pub fn clear(&mut self) {
        self.go_to.iter_mut().for_each(|link| *link = None);
        self.come_from.iter_mut().for_each(|link| *link = None);
        self.flow = 0;
    }

    /// Returns the flow value.
    pub fn flow(&self) -> usize {
        self.flow
    }

    pub fn go_to(&self, node: usize) -> Option<usize> {
        self.go_to[node]
    }

    pub fn come_from(&self, node: usize) -> Option<usize> {
        self.come_from[node]
    }

    /// Checks if a unit of flow passes through `node`.
    pub fn carries_flow(&self, node: usize) -> bool {
        self.go_to[node].is_some() || self.come_from[node].is_some()
    }

    /// Checks if `node` starts a path.
    pub fn is_source(&self, node: usize) -> bool {
        self.go_to[node].is_some() && self.come_from[node].is_none()
    }

    /// Checks if `node` ends a path.
    pub fn is_target(&self, node: usize) -> bool {
        self.come_from[node].is_some() && self.go_to[node].is_none()
    }

    /// Searches one shortest augmenting path from any unsaturated source in `sources` to any
    /// unsaturated target in `targets` and pushes one unit of flow along it.
    /// Returns `false` if no such path exists, i.e. the flow is maximum.
    pub fn augment(&mut self, graph: &UGraph, sources: &BitSet, targets: &BitSet) -> bool {
        let found = self.search(graph, sources.iter(), sources, targets, |_| true);
        if let Some(target) = found {
            self.push_path(target);
            return true
        }
        false
    }

    /// Like `augment`, but the path has to start at `source` and end at `target`. `sources` and
    /// `targets` still name all terminals, so that no path runs through one of them.
    pub fn augment_pair(
        &mut self,
        graph: &UGraph,
        source: usize,
        target: usize,
        sources: &BitSet,
        targets: &BitSet
    ) -> bool {
        let found = self.search(graph, std::iter::once(source), sources, targets, |t| t == target);
        if let Some(target) = found {
            self.push_path(target);
            return true
        }
        false
    }

    /// Augments until the flow reaches `limit` or is maximum.
    /// Returns the number of augmentations.
    pub fn saturate(&mut self, graph: &UGraph, sources: &BitSet, targets: &BitSet, limit: usize) -> u64 {
        let mut augmentations = 0;
        while self.flow < limit && self.augment(graph, sources, targets) {
            augmentations += 1;
        }
        augmentations
    }

    /// Removes the path starting at `source`.
    /// Returns the target the path ended at.
    pub fn drain_source(&mut self, source: usize) -> usize {
        assert!(self.is_source(source), "{} does not start a path", source);
        let mut node = source;
        while let Some(next) = self.go_to[node].take() {
            self.come_from[next] = None;
            node = next;
        }
        self.flow -= 1;
        node
    }

    /// Removes the path ending at `target`.
    /// Returns the source the path started at.
    pub fn drain_target(&mut self, target: usize) -> usize {
        assert!(self.is_target(target), "{} does not end a path", target);
        let mut node = target;
        while let Some(prev) = self.come_from[node].take() {
            self.go_to[prev] = None;
            node = prev;
        }
        self.flow -= 1;
        node
    }

    /// Computes a minimum vertex cut separating `sources` from `targets`. The flow has to be
    /// maximum. The cut consists of the vertices whose in-port is on the source side of the
    /// residual network and whose out-port is not; saturated sources count as on the source side.
    /// Returns a set over the ids of `graph` with exactly `self.flow()` members.
    pub fn vertex_cut(&mut self, graph: &UGraph, sources: &BitSet, targets: &BitSet) -> BitSet {
        let found = self.search(graph, sources.iter(), sources, targets, |_| false);
        debug_assert!(found.is_none());
        let mut cut = BitSet::new(self.go_to.len());
        for node in graph.nodes() {
            let source_side = sources.get(node) || self.seen.get(port(node, IN));
            if source_side && !self.seen.get(port(node, OUT)) {
                cut.set(node);
            }
        }
        debug_assert_eq!(cut.count(), self.flow);
        cut
    }

    /// Checks that all links are mutual and that the number of path starts and path ends both
    /// equal the flow value.
    pub fn is_consistent(&self) -> bool {
        for node in 0..self.go_to.len() {
            if let Some(next) = self.go_to[node] {
                if self.come_from[next] != Some(node) {
                    return false
                }
            }
            if let Some(prev) = self.come_from[node] {
                if self.go_to[prev] != Some(node) {
                    return false
                }
            }
        }
        let starts = (0..self.go_to.len()).filter(|node| self.is_source(*node)).count();
        let ends = (0..self.go_to.len()).filter(|node| self.is_target(*node)).count();
        starts == self.flow && ends == self.flow
    }

    /// Marks `to` as reached from `from` unless it was reached before.
    fn visit(&mut self, from: usize, to: usize) {
        if !self.seen.get(to) {
            self.seen.set(to);
            self.pred[to] = from;
            self.queue.push_back(to);
        }
    }

    /// BFS over the residual port graph, starting at the out-ports of the unsaturated `seeds`.
    /// Stops at the first unsaturated target satisfying `is_goal` and returns it. Afterwards
    /// `self.seen` holds every port reached.
    fn search<I, F>(
        &mut self,
        graph: &UGraph,
        seeds: I,
        sources: &BitSet,
        targets: &BitSet,
        is_goal: F
    ) -> Option<usize>
    where
        I: Iterator<Item=usize>,
        F: Fn(usize) -> bool,
    {
        self.seen.clear();
        self.queue.clear();
        for seed in seeds {
            if graph.contains(seed) && !self.carries_flow(seed) {
                let root = port(seed, OUT);
                self.seen.set(root);
                self.pred[root] = root;
                self.queue.push_back(root);
            }
        }
        while let Some(current) = self.queue.pop_front() {
            let node = current >> 1;
            if current & 1 == OUT {
                if targets.get(node) {
                    continue
                }
                // Undo the unit passing through `node`.
                if self.carries_flow(node) && !sources.get(node) {
                    self.visit(current, port(node, IN));
                }
                for neigh in graph.active_neighbors(node) {
                    if self.go_to[node] != Some(neigh) && !sources.get(neigh) {
                        self.visit(current, port(neigh, IN));
                    }
                }
            } else if !self.carries_flow(node) {
                if !targets.get(node) {
                    self.visit(current, port(node, OUT));
                } else if is_goal(node) {
                    self.pred[port(node, OUT)] = current;
                    return Some(node)
                }
            } else if let Some(prev) = self.come_from[node] {
                // Undo the unit arriving at `node`.
                self.visit(current, port(prev, OUT));
            }
        }
        None
    }

    /// Pushes one unit along the path the last search found to `target`.
    fn push_path(&mut self, target: usize) {
        let mut current = port(target, OUT);
        loop {
            let prev = self.pred[current];
            if prev == current {
                break
            }
            let (from, to) = (prev >> 1, current >> 1);
            if from != to {
                if prev & 1 == OUT {
                    self.go_to[from] = Some(to);
                    self.come_from[to] = Some(from);
                } else {
                    // Cancelled arc `to -> from`. Either link may already be rewritten by an
                    // arc later on the path.
                    if self.come_from[from] == Some(to) {
                        self.come_from[from] = None;
                    }
                    if self.go_to[to] == Some(from) {
                        self.go_to[to] = None;
                    }
                }
            }
            current = prev;
        }
        self.flow += 1;
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reads `text` and returns the graph and a lookup from names to ids.
    fn read(text: &str) -> (UGraph, impl Fn(&str) -> usize) {
        let (graph, names) = UGraph::read_edge_list(Cursor::new(text.to_owned())).unwrap();
        let lookup = move |name: &str| names.iter().position(|n| n == name).unwrap();
        (graph, lookup)
    }

    fn set(graph: &UGraph, members: Vec<usize>) -> BitSet {
        BitSet::from_bits(graph.num_reserved(), members)
    }

    #[test]
    fn path_test() {
        let (graph, id) = read("s a\na b\nb t\n");
        let sources = set(&graph, vec![id("s")]);
        let targets = set(&graph, vec![id("t")]);
        let mut flow = FlowNet::new(graph.num_reserved());
        assert!(flow.augment(&graph, &sources, &targets));
        assert!(!flow.augment(&graph, &sources, &targets));
        assert_eq!(flow.flow(), 1);
        assert_eq!(flow.go_to(id("s")), Some(id("a")));
        assert_eq!(flow.come_from(id("t")), Some(id("b")));
        assert!(flow.is_consistent());
        assert_eq!(flow.drain_source(id("s")), id("t"));
        assert_eq!(flow.flow(), 0);
        assert!(!flow.carries_flow(id("a")));
        assert!(flow.is_consistent());
    }

    #[test]
    fn reroute_test() {
        // The first path s1-a-t1 blocks s2 until it is rerouted over c.
        let (graph, id) = read("s1 a\ns1 c\ns2 a\na t1\nc t2\n");
        let sources = set(&graph, vec![id("s1"), id("s2")]);
        let targets = set(&graph, vec![id("t1"), id("t2")]);
        let mut flow = FlowNet::new(graph.num_reserved());
        assert_eq!(flow.saturate(&graph, &sources, &targets, 2), 2);
        assert!(flow.is_consistent());
        assert_eq!(flow.go_to(id("s1")), Some(id("c")));
        assert_eq!(flow.go_to(id("s2")), Some(id("a")));
        assert_eq!(flow.come_from(id("t1")), Some(id("a")));
        assert_eq!(flow.drain_source(id("s1")), id("t2"));
        assert_eq!(flow.drain_target(id("t1")), id("s2"));
        assert_eq!(flow.flow(), 0);
        assert!(flow.is_consistent());
    }

    #[test]
    fn augment_pair_test() {
        let (graph, id) = read("s1 a\na t1\ns2 b\nb t2\na b\n");
        let sources = set(&graph, vec![id("s1"), id("s2")]);
        let targets = set(&graph, vec![id("t1"), id("t2")]);
        let mut flow = FlowNet::new(graph.num_reserved());
        assert!(flow.augment_pair(&graph, id("s1"), id("t2"), &sources, &targets));
        assert_eq!(flow.come_from(id("t2")), Some(id("b")));
        // Only s2 and t1 remain, and they are connected by rerouting through a and b.
        assert!(flow.augment_pair(&graph, id("s2"), id("t1"), &sources, &targets));
        assert_eq!(flow.flow(), 2);
        assert!(flow.is_consistent());
        assert!(!flow.augment_pair(&graph, id("s2"), id("t1"), &sources, &targets));
    }

    #[test]
    fn terminals_are_not_interior_test() {
        // The only route from s1 to t1 runs through the source s2.
        let (graph, id) = read("s1 s2\ns2 t1\n");
        let sources = set(&graph, vec![id("s1"), id("s2")]);
        let targets = set(&graph, vec![id("t1")]);
        let mut flow = FlowNet::new(graph.num_reserved());
        assert!(flow.augment(&graph, &sources, &targets));
        assert!(flow.is_source(id("s2")));
        assert!(!flow.carries_flow(id("s1")));
        assert!(!flow.augment_pair(&graph, id("s1"), id("t1"), &sources, &targets));
    }

    #[test]
    fn vertex_cut_test() {
        let (graph, id) = read("s1 m\ns2 m\nm t1\nm t2\n");
        let sources = set(&graph, vec![id("s1"), id("s2")]);
        let targets = set(&graph, vec![id("t1"), id("t2")]);
        let mut flow = FlowNet::new(graph.num_reserved());
        flow.saturate(&graph, &sources, &targets, 2);
        assert_eq!(flow.flow(), 1);
        let cut = flow.vertex_cut(&graph, &sources, &targets);
        assert_eq!(cut.iter().collect::<Vec<_>>(), vec![id("m")]);
    }

    #[test]
    fn vertex_cut_at_terminal_test() {
        // Both paths have to use the target t.
        let (graph, id) = read("s1 a\ns2 b\na t\nb t\n");
        let sources = set(&graph, vec![id("s1"), id("s2")]);
        let targets = set(&graph, vec![id("t")]);
        let mut flow = FlowNet::new(graph.num_reserved());
        flow.saturate(&graph, &sources, &targets, 2);
        assert_eq!(flow.flow(), 1);
        let cut = flow.vertex_cut(&graph, &sources, &targets);
        assert_eq!(cut.iter().collect::<Vec<_>>(), vec![id("t")]);
    }

    #[test]
    fn disabled_test() {
        let (mut graph, id) = read("s1 m\ns2 m\nm t1\nm t2\ns2 x\nx t2\n");
        let sources = set(&graph, vec![id("s1"), id("s2")]);
        let targets = set(&graph, vec![id("t1"), id("t2")]);
        let mut flow = FlowNet::new(graph.num_reserved());
        assert_eq!(flow.saturate(&graph, &sources, &targets, 2), 2);
        flow.clear();
        graph.disable(id("m"));
        assert_eq!(flow.saturate(&graph, &sources, &targets, 2), 1);
        let cut = flow.vertex_cut(&graph, &sources, &targets);
        assert_eq!(cut.count(), 1);
        assert!(!cut.get(id("m")));
        assert!(flow.is_consistent());
    }
}
