//! Randomized upper bounds for the odd cycle cover problem.
//!
//! The heuristic 2-colors the graph at random, flips vertices that have more monochromatic than
//! bichromatic edges until no such vertex remains, and then repeatedly puts the vertex with the
//! most monochromatic edges into the cover until the uncovered part is properly colored.

use log::debug;
use rand::Rng;
use crate::bitset::BitSet;
use crate::graph::UGraph;
use crate::occ::is_occ;

/// Returns an OCC of `graph`, usually not a minimum one.
pub fn occ_heuristic<R: Rng>(graph: &UGraph, rng: &mut R) -> BitSet {
    let size = graph.num_reserved();
    let mut colors = BitSet::new(size);
    for node in graph.nodes() {
        colors.put(node, rng.gen());
    }

    // Every flip reduces the number of monochromatic edges, so this terminates.
    let mut node = 0;
    while node < size {
        let (conflicts, ok) = graph
            .active_neighbors(node)
            .fold((0, 0), |(conflicts, ok), neigh| {
                if colors.get(neigh) == colors.get(node) {
                    (conflicts + 1, ok)
                } else {
                    (conflicts, ok + 1)
                }
            });
        if conflicts > ok {
            colors.toggle(node);
            node = 0;
        } else {
            node += 1;
        }
    }

    let mut occ = BitSet::new(size);
    loop {
        let worst = graph
            .nodes()
            .filter(|node| !occ.get(*node))
            .map(|node| {
                let conflicts = graph
                    .active_neighbors(node)
                    .filter(|neigh| !occ.get(*neigh) && colors.get(*neigh) == colors.get(node))
                    .count();
                (conflicts, node)
            })
            .filter(|(conflicts, _)| *conflicts > 0)
            // Ties go to the smallest id.
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        match worst {
            Some((_, node)) => occ.set(node),
            None => break,
        }
    }
    debug_assert!(is_occ(graph, &occ));
    occ
}

/// Runs `occ_heuristic` `1 + rounds` times and returns the smallest cover found.
pub fn best_occ_heuristic<R: Rng>(graph: &UGraph, rounds: usize, rng: &mut R) -> BitSet {
    let mut best = occ_heuristic(graph, rng);
    for _ in 0..rounds {
        let occ = occ_heuristic(graph, rng);
        if occ.count() < best.count() {
            best = occ;
        }
    }
    debug!("heuristic cover of size {} after {} extra rounds", best.count(), rounds);
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    #[test]
    fn heuristic_test() {
        let gr = Cursor::new("1 2\n1 3\n1 4\n1 5\n1 6\n2 3\n2 4\n2 5\n2 10\n\
                              3 4\n3 5\n3 9\n4 5\n4 8\n5 7\n6 11\n6 12\n7 13\n8 14\n\
                              9 15\n10 16\n11 12\n11 13\n11 15\n11 16\n12 13\n12 14\n\
                              12 16\n13 14\n13 15\n14 15\n14 16\n15 16\n");
        let (graph, _) = UGraph::read_edge_list(gr).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let occ = occ_heuristic(&graph, &mut rng);
            assert!(is_occ(&graph, &occ));
        }
        let best = best_occ_heuristic(&graph, 50, &mut rng);
        assert!(is_occ(&graph, &best));
        // {1..5} is a 5-clique, so at least 3 of its vertices are needed.
        assert!(best.count() >= 3);
    }

    #[test]
    fn single_edge_test() {
        let gr = Cursor::new("a b\n");
        let (graph, _) = UGraph::read_edge_list(gr).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            // A monochromatic edge has 1 conflict and 0 ok at both ends and gets flipped.
            assert!(occ_heuristic(&graph, &mut rng).is_empty());
        }
    }

    #[test]
    fn triangle_test() {
        let gr = Cursor::new("a b\nb c\nc a\n");
        let (graph, _) = UGraph::read_edge_list(gr).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            assert_eq!(occ_heuristic(&graph, &mut rng).count(), 1);
        }
    }
}
