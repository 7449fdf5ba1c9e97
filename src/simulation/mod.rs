pub mod monte_carlo;
pub mod traits;

pub use monte_carlo::MonteCarloSimulator;
pub use traits::{DailySummary, PathSimulator, SimulatedPaths};
