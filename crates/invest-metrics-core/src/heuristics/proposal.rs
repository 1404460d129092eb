use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::capital_budgeting::cash_flows::{FinancialInputs, YearlySpend};
use crate::capital_budgeting::irr::IrrSolverConfig;
use crate::capital_budgeting::metrics::{compute_metrics, metric_warnings, FinancialMetrics};
use crate::error::InvestmentMetricsError;
use crate::types::*;
use crate::InvestmentMetricsResult;

use super::defaults::HeuristicTable;

/// An investment request as entered on the submission form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentProposal {
    /// Total capital spend requested
    pub capex: Money,
    /// Total operating spend requested
    pub opex: Money,
    /// First calendar year of the project
    pub start_year: i32,
    /// Last calendar year of the project (inclusive)
    pub end_year: i32,
    /// Business-case tags, e.g. "ESG", "Cost Control"
    #[serde(default)]
    pub business_cases: Vec<String>,
    /// Overrides the heuristic discount rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_rate: Option<Rate>,
    /// Overrides the heuristic inflow estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_cash_inflow: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_cash_outflow: Option<Money>,
    /// Spend keyed by calendar year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly_breakdown: Option<BTreeMap<i32, YearlySpend>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<IrrSolverConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalEvaluation {
    /// Inputs actually evaluated, after defaults were filled in
    pub inputs: FinancialInputs,
    /// Fields taken from the heuristic table rather than the proposal
    pub defaults_applied: Vec<String>,
    pub metrics: FinancialMetrics,
}

/// Resolve a proposal into `FinancialInputs`, filling gaps from `table`.
///
/// Returns the inputs, the names of defaulted fields and any warnings.
pub fn build_financial_inputs(
    proposal: &InvestmentProposal,
    table: &HeuristicTable,
) -> InvestmentMetricsResult<(FinancialInputs, Vec<String>, Vec<String>)> {
    if proposal.capex < Decimal::ZERO {
        return Err(InvestmentMetricsError::invalid("capex", "Capital spend cannot be negative"));
    }
    if proposal.opex < Decimal::ZERO {
        return Err(InvestmentMetricsError::invalid("opex", "Operating spend cannot be negative"));
    }
    if proposal.end_year < proposal.start_year {
        return Err(InvestmentMetricsError::invalid(
            "end_year",
            "End year must not precede start year",
        ));
    }

    let total_investment = proposal.capex.checked_add(proposal.opex).ok_or_else(|| {
        InvestmentMetricsError::FinancialImpossibility("capex + opex overflows".into())
    })?;
    let project_duration = proposal
        .end_year
        .checked_sub(proposal.start_year)
        .and_then(|span| span.checked_add(1))
        .and_then(|span| u32::try_from(span).ok())
        .ok_or_else(|| InvestmentMetricsError::invalid("end_year", "Project span is too long"))?;

    let mut defaults_applied = Vec::new();
    let mut warnings = Vec::new();

    let discount_rate = match proposal.discount_rate {
        Some(rate) => rate,
        None => {
            defaults_applied.push("discount_rate".to_string());
            table.default_discount_rate(proposal.business_cases.as_slice())
        }
    };

    let annual_cash_inflow = match proposal.annual_cash_inflow {
        Some(inflow) => inflow,
        None => {
            defaults_applied.push("annual_cash_inflow".to_string());
            table.estimated_annual_inflow(
                total_investment,
                proposal.business_cases.as_slice(),
                project_duration,
            )?
        }
    };

    let yearly_breakdown = proposal.yearly_breakdown.as_ref().map(|by_year| {
        let mut by_period = BTreeMap::new();
        for (year, spend) in by_year {
            if *year < proposal.start_year || *year > proposal.end_year {
                warnings.push(format!(
                    "Breakdown for {year} falls outside {}-{} and was dropped",
                    proposal.start_year, proposal.end_year
                ));
                continue;
            }
            let period = (year - proposal.start_year + 1) as u32;
            by_period.insert(period, spend.clone());
        }
        by_period
    });

    let inputs = FinancialInputs {
        initial_investment: total_investment,
        discount_rate,
        project_duration,
        annual_cash_inflow,
        annual_cash_outflow: proposal.annual_cash_outflow,
        yearly_breakdown,
        solver: proposal.solver.clone(),
    };

    Ok((inputs, defaults_applied, warnings))
}

/// Evaluate a submitted proposal end to end.
pub fn evaluate_proposal(
    proposal: &InvestmentProposal,
    table: &HeuristicTable,
) -> InvestmentMetricsResult<ComputationOutput<ProposalEvaluation>> {
    let start = Instant::now();

    let (inputs, defaults_applied, mut warnings) = build_financial_inputs(proposal, table)?;
    let metrics = compute_metrics(&inputs)?;
    warnings.extend(metric_warnings(&inputs, &metrics));

    let output = ProposalEvaluation {
        inputs,
        defaults_applied,
        metrics,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Investment proposal: heuristic defaults, then NPV, IRR, payback, ROI",
        &serde_json::json!({
            "capex": proposal.capex.to_string(),
            "opex": proposal.opex.to_string(),
            "start_year": proposal.start_year,
            "end_year": proposal.end_year,
            "business_cases": proposal.business_cases,
        }),
        warnings,
        elapsed,
        output,
    )
}
