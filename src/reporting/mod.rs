pub mod charts;
pub mod report;

pub use charts::ChartWriter;
pub use report::PortfolioReport;
