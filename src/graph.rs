//! Implementation of a simple, undirected graph data structure over a dense id space with basic
//! static and dynamic functions.
//!
//! A vertex id is either absent (never part of the graph, or dropped by `subgraph`) or present.
//! Present vertices can additionally be disabled: they keep their adjacency, but every traversal
//! through `active_neighbors` and `nodes` skips them until they are enabled again.

use fxhash::{FxHashMap, FxHashSet};
use log::warn;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use crate::bitset::BitSet;
use crate::cust_error::ImportError;

/// A simple undirected graph datastructure that supports disabling vertices.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct UGraph {
    adj_list: Vec<Option<Vec<usize>>>,
    disabled: BitSet,
}

// Static functions
impl UGraph {

    /// Creates a graph with `n` present, isolated vertices.
    pub fn new(n: usize) -> Self {
        UGraph {
            adj_list: vec![Some(Vec::new()); n],
            disabled: BitSet::new(n),
        }
    }

    /// Returns the amount of reserved ids of `self`. Present or not.
    pub fn num_reserved(&self) -> usize {
        self.adj_list.len()
    }

    /// Checks if `node` is present and enabled.
    pub fn contains(&self, node: usize) -> bool {
        self.adj_list[node].is_some() && !self.disabled.get(node)
    }

    /// Checks if `node` is present, enabled or not.
    pub fn is_present(&self, node: usize) -> bool {
        self.adj_list[node].is_some()
    }

    pub fn is_disabled(&self, node: usize) -> bool {
        self.disabled.get(node)
    }

    /// Returns an `Iterator` over all present and enabled nodes.
    pub fn nodes(&self) -> impl Iterator<Item=usize> + '_ {
        (0..self.adj_list.len()).filter(move |node| self.contains(*node))
    }

    /// Returns the number of present and enabled nodes of `self`.
    pub fn num_nodes(&self) -> usize {
        self.nodes().count()
    }

    /// Returns an `Iterator` over the enabled neighbors of `node`. Empty if `node` is absent.
    pub fn active_neighbors(&self, node: usize) -> impl Iterator<Item=usize> + '_ {
        self.adj_list[node]
            .iter()
            .flatten()
            .copied()
            .filter(move |neigh| !self.disabled.get(*neigh))
    }

    /// Returns the degree of `node` counting disabled neighbors, or `None` if `node` is absent.
    pub fn degree(&self, node: usize) -> Option<usize> {
        self.adj_list[node].as_ref().map(|neighbors| neighbors.len())
    }

    /// Checks if the edge `{v, w}` exists.
    pub fn is_connected(&self, v: usize, w: usize) -> bool {
        if let Some(neighs) = &self.adj_list[v] {
            return neighs.contains(&w)
        }
        false
    }

    /// Returns an iterator over all edges between enabled nodes, each once as `(v, w)` with
    /// `v < w`.
    pub fn edges(&self) -> impl Iterator<Item=(usize, usize)> + '_ {
        self.nodes()
            .flat_map(move |v| {
                self.active_neighbors(v)
                    .filter(move |w| v < *w)
                    .map(move |w| (v, w))
            })
    }

    /// Returns the number of edges between enabled nodes.
    pub fn num_edges(&self) -> usize {
        self.edges().count()
    }

    /// Returns the subgraph induced by the present nodes in `set`. Nodes outside of `set` become
    /// absent, the id space is unchanged.
    pub fn subgraph(&self, set: &BitSet) -> Self {
        assert_eq!(set.len(), self.num_reserved(), "`set` must span the id space of `self`");
        let adj_list = self.adj_list
            .iter()
            .enumerate()
            .map(|(v, adj)| {
                if !set.get(v) {
                    return None
                }
                adj.as_ref().map(|neighs| {
                    neighs.iter().copied().filter(|w| set.get(*w)).collect()
                })
            })
            .collect();
        UGraph {
            adj_list,
            disabled: self.disabled.clone(),
        }
    }

    /// Computes a proper 2-coloring of the present and enabled nodes with a BFS per component.
    /// Returns `None` if an odd cycle exists. Absent and disabled nodes get color `false`.
    pub fn two_coloring(&self) -> Option<BitSet> {
        let size = self.num_reserved();
        let mut colors = BitSet::new(size);
        let mut seen = BitSet::new(size);
        let mut queue = VecDeque::with_capacity(size);
        for root in self.nodes() {
            if seen.get(root) {
                continue
            }
            seen.set(root);
            queue.push_back(root);
            while let Some(v) = queue.pop_front() {
                let color = colors.get(v);
                for w in self.active_neighbors(v) {
                    if !seen.get(w) {
                        seen.set(w);
                        colors.put(w, !color);
                        queue.push_back(w);
                    } else if colors.get(w) == color {
                        return None
                    }
                }
            }
        }
        Some(colors)
    }

    /// Checks if `self` has no odd cycle.
    pub fn is_bipartite(&self) -> bool {
        self.two_coloring().is_some()
    }

}

// Dynamic functions
impl UGraph {

    /// Adds the edge `{v, w}`, making both nodes present. Does not check for duplicates.
    pub fn connect(&mut self, v: usize, w: usize) {
        assert!(v != w, "self-loop at {}", v);
        self.adj_list[v].get_or_insert_with(Vec::new).push(w);
        self.adj_list[w].get_or_insert_with(Vec::new).push(v);
    }

    /// Removes the edge `{v, w}` if it exists.
    pub fn disconnect(&mut self, v: usize, w: usize) {
        if let Some(ref mut nn) = self.adj_list[v] {
            nn.retain(|neigh| *neigh != w);
        }
        if let Some(ref mut nn) = self.adj_list[w] {
            nn.retain(|neigh| *neigh != v);
        }
    }

    pub fn disable(&mut self, node: usize) {
        self.disabled.set(node);
    }

    pub fn enable(&mut self, node: usize) {
        self.disabled.unset(node);
    }

    /// Extends the id space to `size`. The new ids are present, enabled and isolated.
    pub fn grow(&mut self, size: usize) {
        if size <= self.num_reserved() {
            return
        }
        self.adj_list.resize(size, Some(Vec::new()));
        let mut disabled = BitSet::new(size);
        for node in self.disabled.iter() {
            disabled.set(node);
        }
        self.disabled = disabled;
    }

}

impl UGraph {

    /// Reads a line-oriented edge list: two whitespace separated vertex names per line, `#`
    /// starts a comment. Vertex ids are assigned in order of first appearance.
    /// Returns the graph and the names of its vertices, indexed by id.
    pub fn read_edge_list<R: BufRead>(input: R) -> Result<(Self, Vec<String>), ImportError> {
        let mut ids: FxHashMap<String, usize> = FxHashMap::default();
        let mut names: Vec<String> = Vec::new();
        let mut edges = Vec::new();
        let mut known: FxHashSet<(usize, usize)> = FxHashSet::default();
        for (line_num, line) in input.lines().enumerate() {
            let line = line?;
            let line_num = line_num + 1;
            let mut tokens = line.split_whitespace();
            let src = match tokens.next() {
                Some(token) if !token.starts_with('#') => token,
                _ => continue,
            };
            let trg = match tokens.next() {
                Some(token) if !token.starts_with('#') => token,
                _ => return Err(ImportError::SyntaxError(line_num)),
            };
            if let Some(rest) = tokens.next() {
                if !rest.starts_with('#') {
                    warn!("ignoring trailing garbage on line {}", line_num);
                }
            }
            if src == trg {
                return Err(ImportError::SelfLoop(line_num))
            }
            let mut id_of = |name: &str| -> usize {
                if let Some(id) = ids.get(name) {
                    return *id
                }
                let id = names.len();
                ids.insert(name.to_owned(), id);
                names.push(name.to_owned());
                id
            };
            let v = id_of(src);
            let w = id_of(trg);
            if !known.insert((v.min(w), v.max(w))) {
                warn!("duplicate edge {{{}, {}}} on line {}", src, trg, line_num);
                continue
            }
            edges.push((v, w));
        }
        let mut graph = UGraph::new(names.len());
        for (v, w) in edges {
            graph.connect(v, w);
        }
        Ok((graph, names))
    }

    /// Writes `self` as an edge list using `names`. Present, enabled nodes without enabled
    /// neighbors are written on their own.
    pub fn write_edge_list<W: Write>(&self, names: &[String], mut out: W) -> Result<(), io::Error> {
        for v in self.nodes() {
            if self.active_neighbors(v).next().is_none() {
                writeln!(out, "{}", names[v])?;
            }
            for w in self.active_neighbors(v).filter(|w| v < *w) {
                writeln!(out, "{} {}", names[v], names[w])?;
            }
        }
        Ok(())
    }

}
