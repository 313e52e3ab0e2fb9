mod generator;
mod heuristics;

pub use generator::*;
pub use heuristics::*;
