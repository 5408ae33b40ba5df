//! Compression step for odd cycle covers (OCC).
//!
//! Given a graph `G` and an OCC `X` of size `k`, `shrink` decides whether an OCC of size `k-1`
//! exists and builds one. The auxiliary graph `H` consists of the bipartite graph `G - X` with a
//! fixed 2-coloring, plus two copies of every `x` in `X`: the original `x` takes the edges to
//! neighbors of color `true`, the clone `x'` the edges to neighbors of color `false`. `H` is
//! bipartite.
//!
//! A role assignment keeps some cover vertices. A kept vertex is either a `Source` (`x` is a flow
//! source and `x'` a target) or a `Target` (the other way around). If the maximum flow between
//! the enabled sources and targets is smaller than the number of kept vertices, the minimum
//! vertex cut together with the cover vertices that were not kept is a smaller OCC.
//!
//! Two enumeration strategies exist:
//! * Gray code: all `3^k` assignments in a ternary reflected Gray code, so consecutive
//!   assignments differ in one role and the flow can be updated instead of recomputed.
//! * Branch and bound: kept cover vertices that are adjacent in `G` need different roles, so
//!   roles are propagated through `G[X]` and contradicting vertices are excluded right away.
//!
//! Assignments that only swap all roles give the same flow problem, so only one of them is
//! tried.

use fxhash::FxHashMap;
use log::{debug, trace};
use crate::bitset::BitSet;
use crate::flow::FlowNet;
use crate::graph::UGraph;

/// Checks if removing `occ` from `graph` leaves a bipartite graph.
pub fn is_occ(graph: &UGraph, occ: &BitSet) -> bool {
    assert_eq!(occ.len(), graph.num_reserved(), "`occ` must span the id space of `graph`");
    let mut rest = occ.clone();
    rest.invert();
    graph.subgraph(&rest).is_bipartite()
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ShrinkOptions {
    /// Enumerate only role assignments that 2-color the kept cover vertices.
    pub branch_and_bound: bool,
    /// Update the flow incrementally between assignments instead of recomputing it.
    pub gray_incremental: bool,
    /// The last vertex of the cover cannot be part of a smaller cover, so it is always kept.
    pub last_not_in_occ: bool,
}

/// Counters of the work done, shared by all `shrink` calls of one run.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SearchStats {
    /// Successful augmenting paths, including those of full recomputations.
    pub augmentations: u64,
    /// Role assignments whose flow was checked.
    pub subsets_examined: u64,
    /// Successful calls of `shrink`.
    pub shrinks: u64,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Role {
    Source,
    Target,
    /// Stays in the cover.
    Disabled,
    /// Not decided yet (branch and bound only).
    Undecided,
    /// Stays in the cover because its neighbors force both roles (branch and bound only).
    Excluded,
}

impl Role {
    /// The digit of the role in the Gray code. Neighboring digits differ in one enabled pair.
    fn digit(self) -> i8 {
        match self {
            Role::Source => 0,
            Role::Target => 2,
            _ => 1,
        }
    }

    fn from_digit(digit: i8) -> Self {
        match digit {
            0 => Role::Source,
            2 => Role::Target,
            _ => Role::Disabled,
        }
    }

    fn opposite(self) -> Option<Self> {
        match self {
            Role::Source => Some(Role::Target),
            Role::Target => Some(Role::Source),
            _ => None,
        }
    }
}

/// Tries to find an OCC of `graph` smaller than `occ`.
/// Returns `None` if the compression finds none. `occ` has to be an OCC of `graph`.
pub fn shrink(
    graph: &UGraph,
    occ: &BitSet,
    options: ShrinkOptions,
    stats: &mut SearchStats
) -> Option<BitSet> {
    assert!(is_occ(graph, occ), "`occ` is not an odd cycle cover of `graph`");
    let size = occ.count();
    if size == 0 || (options.last_not_in_occ && size == 1) {
        return None
    }
    let mut problem = OccProblem::new(graph, occ, options, stats);
    let new_occ = if let Some(node) = problem.isolated_cover_vertex() {
        debug!("cover vertex {} is isolated in the auxiliary graph", node);
        let mut new_occ = occ.clone();
        new_occ.unset(node);
        new_occ
    } else if let Some(node) = redundant_cover_vertex(graph, occ) {
        debug!("cover vertex {} is redundant", node);
        let mut new_occ = occ.clone();
        new_occ.unset(node);
        new_occ
    } else if options.branch_and_bound {
        problem.shrink_branch_and_bound()?
    } else {
        problem.shrink_gray()?
    };
    problem.stats.shrinks += 1;
    assert!(new_occ.count() < size);
    assert!(is_occ(graph, &new_occ), "shrinking produced an invalid cover");
    Some(new_occ)
}

/// Returns a vertex of `occ` whose removal from `occ` leaves an OCC.
fn redundant_cover_vertex(graph: &UGraph, occ: &BitSet) -> Option<usize> {
    let mut candidate = occ.clone();
    for node in occ.iter() {
        candidate.unset(node);
        if is_occ(graph, &candidate) {
            return Some(node)
        }
        candidate.set(node);
    }
    None
}

/// The state of one compression: the auxiliary graph, the flow in it and the current roles.
struct OccProblem<'a> {
    graph: &'a UGraph,
    occ: &'a BitSet,
    options: ShrinkOptions,
    stats: &'a mut SearchStats,
    /// The cover vertices. The clone of `occ_vertices[i]` is `first_clone + i`.
    occ_vertices: Vec<usize>,
    first_clone: usize,
    h: UGraph,
    flow: FlowNet,
    sources: BitSet,
    targets: BitSet,
    num_sources: usize,
    roles: Vec<Role>,
}

impl<'a> OccProblem<'a> {

    /// Builds the auxiliary graph of `graph` and `occ`. All cover vertices start `Disabled`.
    fn new(
        graph: &'a UGraph,
        occ: &'a BitSet,
        options: ShrinkOptions,
        stats: &'a mut SearchStats
    ) -> Self {
        let size = graph.num_reserved();
        let occ_vertices: Vec<usize> = occ.iter().collect();
        let num_clones = occ_vertices.len();
        let mut rest = occ.clone();
        rest.invert();
        let mut h = graph.subgraph(&rest);
        let coloring = h.two_coloring().expect("`occ` is an odd cycle cover");
        h.grow(size + num_clones);
        for (i, node) in occ_vertices.iter().copied().enumerate() {
            for neigh in graph.active_neighbors(node) {
                // Edges inside the cover are added once, from their smaller end.
                if occ.get(neigh) && node > neigh {
                    continue
                }
                // Cover vertices are uncolored and thus `false`.
                if coloring.get(neigh) {
                    h.connect(node, neigh);
                } else {
                    h.connect(size + i, neigh);
                }
            }
        }
        debug_assert!(h.is_bipartite());
        for (i, node) in occ_vertices.iter().enumerate() {
            h.disable(*node);
            h.disable(size + i);
        }
        let h_size = h.num_reserved();
        OccProblem {
            graph,
            occ,
            options,
            stats,
            occ_vertices,
            first_clone: size,
            h,
            flow: FlowNet::new(h_size),
            sources: BitSet::new(h_size),
            targets: BitSet::new(h_size),
            num_sources: 0,
            roles: vec![Role::Disabled; num_clones],
        }
    }

    /// Returns a cover vertex whose original or clone has no neighbor in the auxiliary graph. All
    /// its neighbors outside of the cover have the same color, so it can leave the cover.
    fn isolated_cover_vertex(&self) -> Option<usize> {
        self.occ_vertices
            .iter()
            .enumerate()
            .find(|(i, node)| {
                self.h.degree(**node).unwrap_or(0) == 0
                    || self.h.degree(self.first_clone + i).unwrap_or(0) == 0
            })
            .map(|(_, node)| *node)
    }

    /// Returns the flow source and target of cover vertex `i` under `role`, or `None` if `role`
    /// keeps it in the cover.
    fn terminals(&self, i: usize, role: Role) -> Option<(usize, usize)> {
        let (orig, clone) = (self.occ_vertices[i], self.first_clone + i);
        match role {
            Role::Source => Some((orig, clone)),
            Role::Target => Some((clone, orig)),
            _ => None,
        }
    }

    fn disable_pair(&mut self, i: usize) {
        self.h.disable(self.occ_vertices[i]);
        self.h.disable(self.first_clone + i);
    }

    /// Enables the pair of cover vertex `i` as terminals for `role`.
    fn add_terminals(&mut self, i: usize, role: Role) {
        let (source, target) = self.terminals(i, role).expect("`role` keeps the vertex");
        self.sources.set(source);
        self.targets.set(target);
        self.h.enable(source);
        self.h.enable(target);
        self.num_sources += 1;
        self.roles[i] = role;
    }

    /// Removes the terminals of cover vertex `i` from the terminal sets. The pair stays enabled.
    /// Returns the former source and target.
    fn remove_terminals(&mut self, i: usize) -> (usize, usize) {
        let (source, target) = self.terminals(i, self.roles[i]).expect("vertex is kept");
        self.sources.unset(source);
        self.targets.unset(target);
        self.num_sources -= 1;
        (source, target)
    }

    /// Builds the smaller cover from the current roles and the minimum cut of the (maximum, but
    /// not saturating) flow.
    fn assemble_occ(&mut self) -> BitSet {
        debug!("found small cut after {} subsets examined", self.stats.subsets_examined);
        let cut = self.flow.vertex_cut(&self.h, &self.sources, &self.targets);
        let mut new_occ = BitSet::new(self.graph.num_reserved());
        for (i, node) in self.occ_vertices.iter().enumerate() {
            if self.terminals(i, self.roles[i]).is_none() {
                new_occ.set(*node);
            }
        }
        for node in cut.iter() {
            if node >= self.first_clone {
                new_occ.set(self.occ_vertices[node - self.first_clone]);
            } else {
                new_occ.set(node);
            }
        }
        debug_assert!(new_occ.count() < self.occ.count());
        new_occ
    }

}

// Gray code enumeration
impl<'a> OccProblem<'a> {

    /// Changes the role of cover vertex `i`. With incremental updates the paths of the old
    /// terminals are drained, which leaves the flow maximum for the remaining terminals.
    fn update_role(&mut self, i: usize, role: Role) {
        if self.terminals(i, self.roles[i]).is_some() {
            let (source, target) = self.remove_terminals(i);
            if self.options.gray_incremental && self.flow.drain_source(source) != target {
                self.flow.drain_target(target);
            }
        }
        if self.terminals(i, role).is_some() {
            self.add_terminals(i, role);
        } else {
            self.disable_pair(i);
            self.roles[i] = role;
        }
    }

    /// Enumerates the role assignments in a ternary reflected Gray code. Digit `i` is the role
    /// of cover vertex `i`. Written with digit 0 rightmost, the codes for `k = 3` start
    ///
    /// ```text
    /// S S S, S S D, S S T, S D T, S D D, S D S, S T S, S T D, S T T,
    /// D T T, D T D, D T S, D D S, D D D, ...
    /// ```
    ///
    /// Everything after `D D D` mirrors an earlier assignment, and `D D D` itself has no
    /// terminals. If the last vertex is known to stay out of the cover, only the assignments
    /// with the last digit `S` are needed.
    fn shrink_gray(&mut self) -> Option<BitSet> {
        let k = self.occ_vertices.len();
        let mut num_codes = if self.options.last_not_in_occ {
            3u64.checked_pow(k as u32 - 1).unwrap_or(u64::MAX)
        } else {
            3u64.checked_pow(k as u32).map_or(u64::MAX, |codes| codes / 2)
        };
        let mut direction = vec![1i8; k];
        for i in 0..k {
            self.update_role(i, Role::Source);
        }
        loop {
            self.stats.subsets_examined += 1;
            if !self.options.gray_incremental {
                self.flow.clear();
            }
            self.stats.augmentations += self.flow.saturate(
                &self.h, &self.sources, &self.targets, self.num_sources);
            if self.flow.flow() < self.num_sources {
                return Some(self.assemble_occ())
            }
            num_codes -= 1;
            if num_codes == 0 {
                return None
            }
            let mut i = 0;
            let mut digit = self.roles[0].digit() + direction[0];
            while !(0..3).contains(&digit) {
                direction[i] = -direction[i];
                i += 1;
                if i >= k {
                    return None
                }
                digit = self.roles[i].digit() + direction[i];
            }
            trace!("cover vertex {} becomes {:?}", self.occ_vertices[i], Role::from_digit(digit));
            self.update_role(i, Role::from_digit(digit));
        }
    }

}

// Branch and bound over 2-colorings
impl<'a> OccProblem<'a> {

    /// Gives cover vertex `i` the role `role` and routes one more unit of flow.
    /// Returns `false` if the flow can not be saturated anymore.
    fn color(&mut self, i: usize, role: Role) -> bool {
        self.add_terminals(i, role);
        self.stats.subsets_examined += 1;
        if !self.options.gray_incremental {
            self.flow.clear();
            self.stats.augmentations += self.flow.saturate(
                &self.h, &self.sources, &self.targets, self.num_sources);
            return self.flow.flow() == self.num_sources
        }
        let (source, target) = self.terminals(i, role).expect("`role` keeps the vertex");
        let augmented = self.flow.augment_pair(
            &self.h, source, target, &self.sources, &self.targets);
        self.stats.augmentations += augmented as u64;
        augmented
    }

    /// Undoes `color` for cover vertex `i`, leaving the pair enabled and the vertex `Undecided`.
    /// If the paths of the pair's source and target differ, the two orphaned ends are joined
    /// again, so the flow saturates the remaining terminals.
    fn uncolor(&mut self, i: usize) {
        let (source, target) = self.remove_terminals(i);
        self.roles[i] = Role::Undecided;
        if !self.options.gray_incremental {
            return
        }
        let far_target = self.flow.drain_source(source);
        if far_target != target {
            let far_source = self.flow.drain_target(target);
            self.h.disable(source);
            self.h.disable(target);
            let joined = self.flow.augment_pair(
                &self.h, far_source, far_target, &self.sources, &self.targets);
            debug_assert!(joined, "the remaining terminals were saturated before");
            self.stats.augmentations += joined as u64;
            self.h.enable(source);
            self.h.enable(target);
        }
    }

    /// Enumerates the 2-colorings of subsets of the cover, propagating roles along the edges of
    /// `G[X]` in BFS order.
    fn shrink_branch_and_bound(&mut self) -> Option<BitSet> {
        let k = self.occ_vertices.len();
        let index: FxHashMap<usize, usize> = self.occ_vertices
            .iter()
            .enumerate()
            .map(|(i, node)| (*node, i))
            .collect();
        let mut occ_graph = UGraph::new(k);
        for (i, node) in self.occ_vertices.iter().enumerate() {
            for neigh in self.graph.active_neighbors(*node) {
                if let Some(j) = index.get(&neigh) {
                    if i < *j {
                        occ_graph.connect(i, *j);
                    }
                }
            }
        }
        self.roles.iter_mut().for_each(|role| *role = Role::Undecided);
        let mut queue = Vec::with_capacity(k);
        let mut in_queue = BitSet::new(k);
        if self.options.last_not_in_occ {
            let last = k - 1;
            if !self.color(last, Role::Source) {
                return Some(self.assemble_occ())
            }
            for neigh in occ_graph.active_neighbors(last) {
                queue.push(neigh);
                in_queue.set(neigh);
            }
        }
        self.branch(&occ_graph, &mut queue, 0, &mut in_queue)
    }

    /// Decides the next cover vertex: the head of `queue[qhead..]`, or the first undecided one if
    /// the queue is exhausted. Tries every role consistent with the decided neighbors and recurses.
    /// On return without a result, all roles, enabled pairs, the flow and the queue are as on
    /// entry.
    fn branch(
        &mut self,
        occ_graph: &UGraph,
        queue: &mut Vec<usize>,
        qhead: usize,
        in_queue: &mut BitSet
    ) -> Option<BitSet> {
        let qtail = queue.len();
        let mut qhead = qhead;
        let mut did_enqueue = false;
        let i = if qhead == qtail {
            let i = (0..self.roles.len()).find(|i| self.roles[*i] == Role::Undecided)?;
            in_queue.set(i);
            did_enqueue = true;
            i
        } else {
            qhead += 1;
            queue[qhead - 1]
        };
        debug_assert_eq!(self.roles[i], Role::Undecided);

        // A role forced by decided neighbors, or a contradiction.
        let mut forced = None;
        let mut contradiction = false;
        for neigh in occ_graph.active_neighbors(i) {
            if let Some(role) = self.roles[neigh].opposite() {
                if forced.is_some() && forced != Some(role) {
                    contradiction = true;
                    break
                }
                forced = Some(role);
            }
        }

        if !contradiction {
            for neigh in occ_graph.active_neighbors(i) {
                if self.roles[neigh] == Role::Undecided && !in_queue.get(neigh) {
                    queue.push(neigh);
                    in_queue.set(neigh);
                }
            }
            // Without any kept vertex, `Target` mirrors `Source`.
            let try_both = forced.is_none() && self.num_sources > 0;
            if !self.color(i, forced.unwrap_or(Role::Source)) {
                return Some(self.assemble_occ())
            }
            if let Some(new_occ) = self.branch(occ_graph, queue, qhead, in_queue) {
                return Some(new_occ)
            }
            if try_both {
                self.uncolor(i);
                if !self.color(i, Role::Target) {
                    return Some(self.assemble_occ())
                }
                if let Some(new_occ) = self.branch(occ_graph, queue, qhead, in_queue) {
                    return Some(new_occ)
                }
            }
            for neigh in queue.drain(qtail..) {
                in_queue.unset(neigh);
            }
            self.uncolor(i);
            self.disable_pair(i);
        }

        self.roles[i] = if contradiction { Role::Excluded } else { Role::Disabled };
        if let Some(new_occ) = self.branch(occ_graph, queue, qhead, in_queue) {
            return Some(new_occ)
        }
        self.roles[i] = Role::Undecided;
        if did_enqueue {
            in_queue.unset(i);
        }
        None
    }

}
