pub mod assembler;
pub mod dataset;
pub mod engine;
pub mod fetcher;
pub mod portfolio;
pub mod screener;
