//! Downward search: start from a heuristic cover and compress it until no smaller cover is found.

use log::{debug, info};
use rand::Rng;
use crate::bitset::BitSet;
use crate::cust_error::ProcessingError;
use crate::graph::UGraph;
use crate::heuristic::best_occ_heuristic;
use crate::occ::{is_occ, shrink, SearchStats, ShrinkOptions};

pub const DEFAULT_HEURISTIC_ROUNDS: usize = 100;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct DriverConfig {
    pub shrink: ShrinkOptions,
    /// Heuristic runs beyond the first one.
    pub heuristic_rounds: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            shrink: ShrinkOptions::default(),
            heuristic_rounds: DEFAULT_HEURISTIC_ROUNDS,
        }
    }
}

/// Returns an OCC of `graph` that `shrink` can not make smaller.
pub fn find_occ<R: Rng>(
    graph: &UGraph,
    config: &DriverConfig,
    rng: &mut R,
    stats: &mut SearchStats
) -> Result<BitSet, ProcessingError> {
    let occ = best_occ_heuristic(graph, config.heuristic_rounds, rng);
    reduce_occ(graph, occ, config.shrink, stats)
}

/// Shrinks the OCC `occ` of `graph` until `shrink` finds nothing smaller.
pub fn reduce_occ(
    graph: &UGraph,
    mut occ: BitSet,
    options: ShrinkOptions,
    stats: &mut SearchStats
) -> Result<BitSet, ProcessingError> {
    if !is_occ(graph, &occ) {
        return Err(ProcessingError::InvalidSolution(
            format!("start cover of size {} leaves an odd cycle", occ.count())));
    }
    info!("starting with a cover of size {}", occ.count());
    while let Some(smaller) = shrink(graph, &occ, options, stats) {
        debug!("shrunk cover from {} to {}", occ.count(), smaller.count());
        occ = smaller;
    }
    if !is_occ(graph, &occ) {
        return Err(ProcessingError::InvalidSolution(
            format!("final cover of size {} leaves an odd cycle", occ.count())));
    }
    info!("no smaller cover found, final size {}", occ.count());
    Ok(occ)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    #[test]
    fn find_occ_test() {
        // Three triangles sharing `w`, and a disjoint pentagon.
        let gr = Cursor::new("w a\na b\nb w\nw c\nc d\nd w\nw e\ne f\nf w\n\
                              p q\nq r\nr s\ns t\nt p\n");
        let (graph, names) = UGraph::read_edge_list(gr).unwrap();
        for branch_and_bound in [false, true] {
            for gray_incremental in [false, true] {
                let config = DriverConfig {
                    shrink: ShrinkOptions { branch_and_bound, gray_incremental, last_not_in_occ: false },
                    heuristic_rounds: 5,
                };
                let mut rng = StdRng::seed_from_u64(5);
                let mut stats = SearchStats::default();
                let occ = find_occ(&graph, &config, &mut rng, &mut stats).unwrap();
                assert_eq!(occ.count(), 2);
                assert!(occ.get(names.iter().position(|n| n == "w").unwrap()));
            }
        }
    }

    #[test]
    fn reduce_full_cover_test() {
        let gr = Cursor::new("1 2\n2 3\n3 1\n3 4\n4 5\n5 6\n6 7\n7 3\n");
        let (graph, _) = UGraph::read_edge_list(gr).unwrap();
        let mut stats = SearchStats::default();
        let full = BitSet::full(graph.num_reserved());
        let occ = reduce_occ(&graph, full, ShrinkOptions::default(), &mut stats).unwrap();
        // Only "3" lies on both odd cycles.
        assert_eq!(occ.iter().collect::<Vec<_>>(), vec![2]);
        assert!(stats.shrinks >= 1 && stats.shrinks <= 6);
    }

    #[test]
    fn invalid_start_test() {
        let gr = Cursor::new("a b\nb c\nc a\n");
        let (graph, _) = UGraph::read_edge_list(gr).unwrap();
        let mut stats = SearchStats::default();
        let res = reduce_occ(&graph, BitSet::new(3), ShrinkOptions::default(), &mut stats);
        assert!(matches!(res, Err(ProcessingError::InvalidSolution(_))));
    }
}
