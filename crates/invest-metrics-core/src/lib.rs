pub mod error;
pub mod types;

#[cfg(feature = "capital_budgeting")]
pub mod capital_budgeting;

#[cfg(feature = "heuristics")]
pub mod heuristics;

pub use error::InvestmentMetricsError;
pub use types::*;

/// Standard result type for all investment-metrics operations
pub type InvestmentMetricsResult<T> = Result<T, InvestmentMetricsError>;
