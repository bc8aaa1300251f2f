pub mod accession;
pub mod report;
pub mod tickers;

pub use accession::AccessionNumber;
pub use report::FilingType;
pub use tickers::{normalize_cik, Ticker};
