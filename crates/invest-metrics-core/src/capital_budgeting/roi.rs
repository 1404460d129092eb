use rust_decimal::Decimal;

use crate::error::InvestmentMetricsError;
use crate::types::{Money, Percent};
use crate::InvestmentMetricsResult;

use super::cash_flows::{total_net_flow, CashFlowPeriod};

/// Return on investment over the whole horizon, as a percentage.
///
/// `(sum(net_flow) - initial_investment) / initial_investment * 100`
pub fn roi(
    cash_flows: &[CashFlowPeriod],
    initial_investment: Money,
) -> InvestmentMetricsResult<Percent> {
    if initial_investment.is_zero() {
        return Err(InvestmentMetricsError::DivisionByZero {
            context: "ROI with zero initial investment".into(),
        });
    }
    if initial_investment < Decimal::ZERO {
        return Err(InvestmentMetricsError::invalid(
            "initial_investment",
            "Initial investment must be positive",
        ));
    }

    total_net_flow(cash_flows)?
        .checked_sub(initial_investment)
        .and_then(|gain| gain.checked_div(initial_investment))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or_else(|| {
            InvestmentMetricsError::FinancialImpossibility(
                "ROI exceeds the representable range".into(),
            )
        })
}
