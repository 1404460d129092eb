//! Capital-budgeting metrics for a proposed investment.
//!
//! The pipeline is `FinancialInputs` -> projected cash flows -> NPV / IRR /
//! payback / ROI. Every function here is pure; the same inputs always yield
//! the same metrics.

pub mod cash_flows;
pub mod irr;
pub mod metrics;
pub mod npv;
pub mod npv_profile;
pub mod payback;
pub mod roi;

pub use cash_flows::{
    project_cash_flows, CashFlowPeriod, FinancialInputs, YearlySpend, MAX_PROJECT_DURATION,
};
pub use irr::{irr, irr_with_config, IrrSolution, IrrSolverConfig, IrrTermination};
pub use metrics::{calculate_financial_metrics, compute_metrics, FinancialMetrics};
pub use npv::npv;
pub use payback::{payback_period, PaybackPeriod};
pub use roi::roi;
