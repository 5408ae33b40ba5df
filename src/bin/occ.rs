//! Binary that reads a graph as an edge list from standard in, computes a small odd cycle cover
//! and writes the names of its vertices to standard out.

use std::error;
use std::io::{self, Write};
use std::time::Instant;

use clap::Parser;
use log::LevelFilter;
use rand::rngs::StdRng;
use rand::SeedableRng;

use odd_cover::driver::{find_occ, DriverConfig, DEFAULT_HEURISTIC_ROUNDS};
use odd_cover::graph::UGraph;
use odd_cover::occ::{SearchStats, ShrinkOptions};

#[derive(Debug, Parser)]
#[command(name = "occ")]
#[command(about = "Finds a small odd cycle cover of a graph given as an edge list on stdin")]
struct Opt {
    /// Enumerate only 2-colorings of the kept cover vertices
    #[arg(short = 'b', long = "branch-and-bound")]
    branch_and_bound: bool,
    /// Update the flow incrementally between role assignments
    #[arg(short = 'g', long = "gray")]
    gray: bool,
    /// Heuristic runs beyond the first one
    #[arg(short = 'r', long, default_value_t = DEFAULT_HEURISTIC_ROUNDS)]
    rounds: usize,
    /// Seed of the random number generator
    #[arg(long)]
    seed: Option<u64>,
    /// Log debug messages to stderr
    #[arg(short = 'v', long)]
    verbose: bool,
    /// Print `n m |occ| seconds augmentations` instead of the cover
    #[arg(short = 's', long)]
    stats: bool,
}

pub fn main() -> Result<(), Box<dyn error::Error>> {
    let opt = Opt::parse();
    env_logger::builder()
        .filter_level(if opt.verbose { LevelFilter::Debug } else { LevelFilter::Info })
        .parse_default_env()
        .init();
    log::debug!("Options: {:?}", opt);

    let stdin = io::stdin();
    let (graph, names) = UGraph::read_edge_list(stdin.lock())?;
    let config = DriverConfig {
        shrink: ShrinkOptions {
            branch_and_bound: opt.branch_and_bound,
            gray_incremental: opt.gray,
            last_not_in_occ: false,
        },
        heuristic_rounds: opt.rounds,
    };
    let mut rng = match opt.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = Instant::now();
    let mut stats = SearchStats::default();
    let occ = find_occ(&graph, &config, &mut rng, &mut stats)?;
    let elapsed = start.elapsed();

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    if opt.stats {
        writeln!(
            stdout,
            "{} {} {} {:.2} {}",
            graph.num_nodes(),
            graph.num_edges(),
            occ.count(),
            elapsed.as_secs_f64(),
            stats.augmentations
        )?;
    } else {
        for node in occ.iter() {
            writeln!(stdout, "{}", names[node])?;
        }
    }
    Ok(())
}
