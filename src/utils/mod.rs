pub mod precision;
pub mod stats;
