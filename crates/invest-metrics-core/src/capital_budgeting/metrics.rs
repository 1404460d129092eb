use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::*;
use crate::InvestmentMetricsResult;

use super::cash_flows::{project_cash_flows, CashFlowPeriod, FinancialInputs};
use super::irr::{irr_with_config, IrrSolution, IrrSolverConfig};
use super::npv::npv;
use super::payback::{payback_period, PaybackPeriod};
use super::roi::roi;

/// Decision metrics for one evaluation of `FinancialInputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    /// IRR as a percentage; `None` when the solver did not converge
    pub irr: Option<Percent>,
    /// Full solver result, including the best estimate when unconverged
    pub irr_solution: IrrSolution,
    pub npv: Money,
    pub payback_period: PaybackPeriod,
    /// ROI as a percentage
    pub roi: Percent,
    /// Series the metrics were computed from
    pub cash_flows: Vec<CashFlowPeriod>,
}

/// Validate the inputs and compute NPV, IRR, payback and ROI.
///
/// Pure: identical inputs always produce identical metrics.
pub fn compute_metrics(inputs: &FinancialInputs) -> InvestmentMetricsResult<FinancialMetrics> {
    inputs.validate()?;

    let cash_flows = project_cash_flows(inputs)?;
    let solver = inputs.solver.clone().unwrap_or_default();

    let npv_value = npv(&cash_flows, inputs.discount_rate, inputs.initial_investment)?;
    let irr_solution = irr_with_config(&cash_flows, inputs.initial_investment, &solver)?;
    let payback = payback_period(&cash_flows, inputs.initial_investment)?;
    let roi_value = roi(&cash_flows, inputs.initial_investment)?;

    Ok(FinancialMetrics {
        irr: irr_solution
            .converged
            .then(|| to_percent(irr_solution.rate)),
        irr_solution,
        npv: npv_value,
        payback_period: payback,
        roi: roi_value,
        cash_flows,
    })
}

/// Compute the metrics and wrap them in the standard output envelope, with
/// warnings for low-confidence or notable results.
pub fn calculate_financial_metrics(
    inputs: &FinancialInputs,
) -> InvestmentMetricsResult<ComputationOutput<FinancialMetrics>> {
    let start = Instant::now();
    let metrics = compute_metrics(inputs)?;
    let warnings = metric_warnings(inputs, &metrics);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Capital budgeting: NPV, IRR (Newton-Raphson), payback period, ROI",
        &serde_json::json!({
            "initial_investment": inputs.initial_investment.to_string(),
            "discount_rate": inputs.discount_rate.to_string(),
            "project_duration": inputs.project_duration,
            "annual_cash_inflow": inputs.annual_cash_inflow.to_string(),
            "annual_cash_outflow": inputs.annual_cash_outflow.unwrap_or(Decimal::ZERO).to_string(),
            "capex_excluded_from_cash_flows": true,
        }),
        warnings,
        elapsed,
        metrics,
    )
}

pub(crate) fn metric_warnings(inputs: &FinancialInputs, metrics: &FinancialMetrics) -> Vec<String> {
    let mut warnings = Vec::new();
    let solver = inputs.solver.clone().unwrap_or_default();

    if !metrics.irr_solution.converged {
        warnings.push(format!(
            "IRR did not converge ({:?} after {} iterations); best estimate {}%",
            metrics.irr_solution.termination,
            metrics.irr_solution.iterations,
            to_percent(metrics.irr_solution.rate).round_dp(4),
        ));
    } else if is_at_boundary(&metrics.irr_solution, &solver) {
        warnings.push("IRR sits at the edge of the search domain; treat as low confidence".into());
    }

    match &metrics.payback_period {
        PaybackPeriod::BeyondHorizon { years } => warnings.push(format!(
            "Investment not recovered within {} periods; payback extrapolated to {}",
            inputs.project_duration,
            years.round_dp(2),
        )),
        PaybackPeriod::Unrecoverable => {
            warnings.push("Investment is never recovered at the final period's run rate".into())
        }
        PaybackPeriod::WithinHorizon { .. } => {}
    }

    if let Some(breakdown) = &inputs.yearly_breakdown {
        let outside: Vec<String> = breakdown
            .keys()
            .filter(|p| **p == 0 || **p > inputs.project_duration)
            .map(|p| p.to_string())
            .collect();
        if !outside.is_empty() {
            warnings.push(format!(
                "Yearly breakdown periods outside the horizon were ignored: {}",
                outside.join(", ")
            ));
        }
    }

    if metrics.npv < Decimal::ZERO {
        warnings.push("Negative NPV at the given discount rate".into());
    }

    warnings
}

fn is_at_boundary(solution: &IrrSolution, config: &IrrSolverConfig) -> bool {
    solution.rate >= config.upper_bound || solution.rate <= config.lower_bound
}
