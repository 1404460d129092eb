use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::InvestmentMetricsError;
use crate::types::{Money, Years};
use crate::InvestmentMetricsResult;

use super::cash_flows::CashFlowPeriod;

/// Time needed for cumulative net cash flow to repay the initial investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaybackPeriod {
    /// Recovered inside the modelled periods
    WithinHorizon { years: Years },
    /// Not recovered inside the horizon; extrapolated at the last period's run rate
    BeyondHorizon { years: Years },
    /// Never recovered: the run rate is zero or negative
    Unrecoverable,
}

impl PaybackPeriod {
    /// Fractional period count, `None` when unrecoverable.
    pub fn years(&self) -> Option<Years> {
        match self {
            PaybackPeriod::WithinHorizon { years } | PaybackPeriod::BeyondHorizon { years } => {
                Some(*years)
            }
            PaybackPeriod::Unrecoverable => None,
        }
    }

    pub fn is_within_horizon(&self) -> bool {
        matches!(self, PaybackPeriod::WithinHorizon { .. })
    }
}

impl PartialOrd for PaybackPeriod {
    /// Shorter payback sorts first; `Unrecoverable` sorts after every finite period.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.years(), other.years()) {
            (Some(a), Some(b)) if a == b && self != other => None,
            (Some(a), Some(b)) => a.partial_cmp(&b),
            (Some(_), None) => Some(Ordering::Less),
            (None, Some(_)) => Some(Ordering::Greater),
            (None, None) => Some(Ordering::Equal),
        }
    }
}

/// Payback period with linear interpolation inside the recovering period.
///
/// Cash is assumed to arrive evenly within a period. If the horizon ends
/// before recovery, the last period's net flow is used as a constant run rate
/// to extrapolate past it.
pub fn payback_period(
    cash_flows: &[CashFlowPeriod],
    initial_investment: Money,
) -> InvestmentMetricsResult<PaybackPeriod> {
    if initial_investment <= Decimal::ZERO {
        return Err(InvestmentMetricsError::invalid(
            "initial_investment",
            "Initial investment must be positive",
        ));
    }

    let mut cumulative = Decimal::ZERO;

    for cf in cash_flows {
        let net = cf.net_flow;
        let before = cumulative;
        cumulative = cumulative.checked_add(net).ok_or_else(|| {
            InvestmentMetricsError::FinancialImpossibility(format!(
                "cumulative net flow overflows in period {}",
                cf.period
            ))
        })?;
        if cumulative >= initial_investment {
            if net.is_zero() {
                return Ok(PaybackPeriod::Unrecoverable);
            }
            // 0 <= shortfall <= net here, so the fraction lies in (0, 1].
            let fraction = (initial_investment - before).checked_div(net).ok_or_else(|| {
                InvestmentMetricsError::FinancialImpossibility(format!(
                    "payback fraction overflows in period {}",
                    cf.period
                ))
            })?;
            let years = Decimal::from(cf.period) - Decimal::ONE + fraction;
            return Ok(PaybackPeriod::WithinHorizon { years });
        }
    }

    let Some(last) = cash_flows.last() else {
        return Ok(PaybackPeriod::Unrecoverable);
    };
    let run_rate = last.net_flow;
    if run_rate <= Decimal::ZERO {
        return Ok(PaybackPeriod::Unrecoverable);
    }

    // A remaining gap too large to express in periods is never recovered.
    let years = initial_investment
        .checked_sub(cumulative)
        .and_then(|shortfall| shortfall.checked_div(run_rate))
        .and_then(|extra| extra.checked_add(Decimal::from(last.period)));
    Ok(match years {
        Some(years) => PaybackPeriod::BeyondHorizon { years },
        None => PaybackPeriod::Unrecoverable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(net: &[Decimal]) -> Vec<CashFlowPeriod> {
        net.iter()
            .enumerate()
            .map(|(i, n)| {
                if *n >= Decimal::ZERO {
                    CashFlowPeriod::new(i as u32 + 1, *n, Decimal::ZERO).unwrap()
                } else {
                    CashFlowPeriod::new(i as u32 + 1, Decimal::ZERO, -*n).unwrap()
                }
            })
            .collect()
    }

    #[test]
    fn test_interpolated_payback() {
        let cfs = series(&[dec!(75000); 10]);
        let result = payback_period(&cfs, dec!(500000)).unwrap();
        let years = result.years().unwrap();
        // 6 full years (450,000) + 50,000 / 75,000
        assert!(result.is_within_horizon());
        assert!((years - dec!(6.6667)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_exact_recovery_at_period_end() {
        let cfs = series(&[dec!(500), dec!(500)]);
        let result = payback_period(&cfs, dec!(1000)).unwrap();
        assert_eq!(result, PaybackPeriod::WithinHorizon { years: dec!(2) });
    }

    #[test]
    fn test_single_period_recovery() {
        let cfs = series(&[dec!(2000)]);
        let result = payback_period(&cfs, dec!(1000)).unwrap();
        assert_eq!(result, PaybackPeriod::WithinHorizon { years: dec!(0.5) });
    }

    #[test]
    fn test_extrapolated_beyond_horizon() {
        let cfs = series(&[dec!(100), dec!(100), dec!(200)]);
        let result = payback_period(&cfs, dec!(1000)).unwrap();
        // 3 + (1000 - 400) / 200 = 6
        assert_eq!(result, PaybackPeriod::BeyondHorizon { years: dec!(6) });
    }

    #[test]
    fn test_zero_run_rate_is_unrecoverable() {
        let cfs = series(&[dec!(100), dec!(0)]);
        let result = payback_period(&cfs, dec!(1000)).unwrap();
        assert_eq!(result, PaybackPeriod::Unrecoverable);
        assert_eq!(result.years(), None);
    }

    #[test]
    fn test_negative_run_rate_is_unrecoverable() {
        let cfs = series(&[dec!(300), dec!(-50)]);
        assert_eq!(
            payback_period(&cfs, dec!(1000)).unwrap(),
            PaybackPeriod::Unrecoverable
        );
    }

    #[test]
    fn test_empty_series_is_unrecoverable() {
        assert_eq!(
            payback_period(&[], dec!(1000)).unwrap(),
            PaybackPeriod::Unrecoverable
        );
    }

    #[test]
    fn test_dip_then_recovery() {
        // Cumulative: 600, 400, 1400 -> recovered in period 3
        let cfs = series(&[dec!(600), dec!(-200), dec!(1000)]);
        let result = payback_period(&cfs, dec!(1000)).unwrap();
        // 2 + (1000 - 400) / 1000 = 2.6
        assert_eq!(result, PaybackPeriod::WithinHorizon { years: dec!(2.6) });
    }

    #[test]
    fn test_non_positive_investment_rejected() {
        let cfs = series(&[dec!(100)]);
        assert!(payback_period(&cfs, Decimal::ZERO).is_err());
        assert!(payback_period(&cfs, dec!(-5)).is_err());
    }

    #[test]
    fn test_ordering_puts_unrecoverable_last() {
        let short = PaybackPeriod::WithinHorizon { years: dec!(2) };
        let long = PaybackPeriod::BeyondHorizon { years: dec!(12) };
        assert!(short < long);
        assert!(long < PaybackPeriod::Unrecoverable);
    }

    #[test]
    fn test_unreachable_extrapolation_is_unrecoverable() {
        // 1e27 at a 1e-20 run rate needs more periods than a decimal can hold.
        let cfs = series(&[dec!(0.00000000000000000001)]);
        assert_eq!(
            payback_period(&cfs, dec!(1000000000000000000000000000)).unwrap(),
            PaybackPeriod::Unrecoverable
        );
    }

    #[test]
    fn test_cumulative_overflow_is_an_error() {
        let big = dec!(70000000000000000000000000000);
        // 7e28 is short of the investment; adding another 7e28 leaves the range.
        let cfs = series(&[big, big]);
        let err = payback_period(&cfs, dec!(79000000000000000000000000000)).unwrap_err();
        assert!(matches!(err, InvestmentMetricsError::FinancialImpossibility(_)));
    }
}
