use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::InvestmentMetricsError;
use crate::types::Money;
use crate::InvestmentMetricsResult;

use super::irr::IrrSolverConfig;

/// Longest horizon accepted, in periods.
pub const MAX_PROJECT_DURATION: u32 = 200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Spend planned for a single project year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlySpend {
    /// Capital spend. Reported alongside the projection but never deducted
    /// from the modelled cash flows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex: Option<Money>,
    /// Operating spend, added to the period's outflow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opex: Option<Money>,
}

/// Caller-supplied description of a proposed investment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialInputs {
    /// Single up-front outflow at period 0
    pub initial_investment: Money,
    /// Discount rate as a fraction (0.10 = 10%)
    pub discount_rate: Decimal,
    /// Number of annual periods modelled
    pub project_duration: u32,
    /// Flat inflow received every period
    pub annual_cash_inflow: Money,
    /// Recurring outflow every period (default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_cash_outflow: Option<Money>,
    /// Per-period spend keyed by 1-based period number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly_breakdown: Option<BTreeMap<u32, YearlySpend>>,
    /// IRR solver overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<IrrSolverConfig>,
}

impl FinancialInputs {
    /// Reject inputs that cannot describe a well-posed project, naming the
    /// offending field.
    pub fn validate(&self) -> InvestmentMetricsResult<()> {
        if self.initial_investment <= Decimal::ZERO {
            return Err(InvestmentMetricsError::invalid(
                "initial_investment",
                "Initial investment must be positive",
            ));
        }
        if self.discount_rate < Decimal::ZERO {
            return Err(InvestmentMetricsError::invalid(
                "discount_rate",
                "Discount rate cannot be negative",
            ));
        }
        if self.project_duration == 0 {
            return Err(InvestmentMetricsError::invalid(
                "project_duration",
                "Project duration must be at least one period",
            ));
        }
        check_duration_cap(self.project_duration)?;
        if self.annual_cash_inflow <= Decimal::ZERO {
            return Err(InvestmentMetricsError::invalid(
                "annual_cash_inflow",
                "Annual cash inflow must be positive",
            ));
        }
        if self
            .annual_cash_outflow
            .is_some_and(|outflow| outflow < Decimal::ZERO)
        {
            return Err(InvestmentMetricsError::invalid(
                "annual_cash_outflow",
                "Annual cash outflow cannot be negative",
            ));
        }
        if let Some(breakdown) = &self.yearly_breakdown {
            for (period, spend) in breakdown {
                if spend.opex.is_some_and(|v| v < Decimal::ZERO) {
                    return Err(InvestmentMetricsError::invalid(
                        format!("yearly_breakdown[{period}].opex"),
                        "Operating spend cannot be negative",
                    ));
                }
                if spend.capex.is_some_and(|v| v < Decimal::ZERO) {
                    return Err(InvestmentMetricsError::invalid(
                        format!("yearly_breakdown[{period}].capex"),
                        "Capital spend cannot be negative",
                    ));
                }
            }
        }
        if let Some(solver) = &self.solver {
            solver.validate()?;
        }
        Ok(())
    }
}

fn check_duration_cap(project_duration: u32) -> InvestmentMetricsResult<()> {
    if project_duration > MAX_PROJECT_DURATION {
        return Err(InvestmentMetricsError::invalid(
            "project_duration",
            format!("Project duration cannot exceed {MAX_PROJECT_DURATION} periods"),
        ));
    }
    Ok(())
}

/// Wire shape of a period; `net_flow` is recomputed on load.
#[derive(Deserialize)]
struct CashFlowPeriodRecord {
    period: u32,
    inflow: Money,
    outflow: Money,
}

/// One projected period of the investment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlowPeriod {
    /// 1-based year offset from project start
    pub period: u32,
    pub inflow: Money,
    pub outflow: Money,
    /// inflow - outflow
    pub net_flow: Money,
}

impl CashFlowPeriod {
    pub fn new(period: u32, inflow: Money, outflow: Money) -> InvestmentMetricsResult<Self> {
        let net_flow = inflow.checked_sub(outflow).ok_or_else(|| {
            InvestmentMetricsError::FinancialImpossibility(format!(
                "net flow for period {period} overflows"
            ))
        })?;
        Ok(CashFlowPeriod {
            period,
            inflow,
            outflow,
            net_flow,
        })
    }
}

impl<'de> Deserialize<'de> for CashFlowPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = CashFlowPeriodRecord::deserialize(deserializer)?;
        CashFlowPeriod::new(record.period, record.inflow, record.outflow)
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Build the per-period cash-flow series for periods `1..=project_duration`.
///
/// Inflow is flat. Outflow is the recurring outflow plus the breakdown's
/// `opex` for that period, if any. Fails only when the horizon exceeds
/// `MAX_PROJECT_DURATION` or an amount leaves the decimal range.
pub fn project_cash_flows(inputs: &FinancialInputs) -> InvestmentMetricsResult<Vec<CashFlowPeriod>> {
    check_duration_cap(inputs.project_duration)?;
    let recurring_outflow = inputs.annual_cash_outflow.unwrap_or(Decimal::ZERO);

    (1..=inputs.project_duration)
        .map(|period| {
            let extra_opex = inputs
                .yearly_breakdown
                .as_ref()
                .and_then(|breakdown| breakdown.get(&period))
                .and_then(|spend| spend.opex)
                .unwrap_or(Decimal::ZERO);
            let outflow = recurring_outflow.checked_add(extra_opex).ok_or_else(|| {
                InvestmentMetricsError::FinancialImpossibility(format!(
                    "outflow for period {period} overflows"
                ))
            })?;
            CashFlowPeriod::new(period, inputs.annual_cash_inflow, outflow)
        })
        .collect()
}

/// Sum of net flows across the series.
pub fn total_net_flow(cash_flows: &[CashFlowPeriod]) -> InvestmentMetricsResult<Money> {
    cash_flows
        .iter()
        .try_fold(Decimal::ZERO, |acc, cf| acc.checked_add(cf.net_flow))
        .ok_or_else(|| {
            InvestmentMetricsError::FinancialImpossibility("total net flow overflows".into())
        })
}
