//! On-disk checkpoints between pipeline stages.
//!
//! Every stage reads only the artifacts declared here, so any stage can be
//! re-run on its own without repeating the rate-limited download.

pub mod artifacts;
pub mod coin_store;

pub use coin_store::CoinStore;
