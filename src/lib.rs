pub mod bitset;
pub mod graph;
pub mod cust_error;
pub mod flow;
pub mod occ;
pub mod heuristic;
pub mod driver;
