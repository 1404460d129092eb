use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::InvestmentMetricsError;
use crate::types::{Money, Rate};
use crate::InvestmentMetricsResult;

use super::cash_flows::CashFlowPeriod;

/// `amount / one_plus_r^exponent`, or `None` when the quotient leaves the
/// decimal range.
///
/// A discount factor that overflows upwards makes the term vanish, so it
/// contributes zero rather than failing.
pub(crate) fn discounted(amount: Money, one_plus_r: Decimal, exponent: i64) -> Option<Money> {
    match one_plus_r.checked_powi(exponent) {
        Some(factor) if !factor.is_zero() => amount.checked_div(factor),
        Some(_) => None,
        None if one_plus_r > Decimal::ONE => Some(Decimal::ZERO),
        None => None,
    }
}

/// Net Present Value of a projected series.
///
/// `NPV = -initial_investment + sum(net_flow_t / (1 + r)^t)` where `t` is the
/// period's own number, so period 1 is discounted once.
pub fn npv(
    cash_flows: &[CashFlowPeriod],
    discount_rate: Rate,
    initial_investment: Money,
) -> InvestmentMetricsResult<Money> {
    if discount_rate <= dec!(-1) {
        return Err(InvestmentMetricsError::invalid(
            "discount_rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let one_plus_r = Decimal::ONE + discount_rate;
    let mut result = -initial_investment;

    for cf in cash_flows {
        result = discounted(cf.net_flow, one_plus_r, i64::from(cf.period))
            .and_then(|term| result.checked_add(term))
            .ok_or_else(|| {
                InvestmentMetricsError::FinancialImpossibility(format!(
                    "NPV through period {} overflows at rate {discount_rate}",
                    cf.period
                ))
            })?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flows(net: &[Decimal]) -> Vec<CashFlowPeriod> {
        net.iter()
            .enumerate()
            .map(|(i, n)| CashFlowPeriod::new(i as u32 + 1, *n, Decimal::ZERO).unwrap())
            .collect()
    }

    #[test]
    fn test_npv_basic() {
        let cfs = flows(&[dec!(300), dec!(400), dec!(500)]);
        let result = npv(&cfs, dec!(0.10), dec!(1000)).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = flows(&[dec!(50), dec!(50), dec!(50)]);
        let result = npv(&cfs, Decimal::ZERO, dec!(100)).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_period_number_is_exponent() {
        // A single flow in period 3 is discounted three times, not once.
        let cfs = vec![CashFlowPeriod::new(3, dec!(1331), Decimal::ZERO).unwrap()];
        let result = npv(&cfs, dec!(0.10), dec!(1000)).unwrap();
        assert!(result.abs() < dec!(0.000001));
    }

    #[test]
    fn test_negative_net_flow_reduces_npv() {
        let cfs = vec![
            CashFlowPeriod::new(1, dec!(100), dec!(300)).unwrap(),
            CashFlowPeriod::new(2, dec!(1000), Decimal::ZERO).unwrap(),
        ];
        let result = npv(&cfs, Decimal::ZERO, dec!(500)).unwrap();
        assert_eq!(result, dec!(300));
    }

    #[test]
    fn test_rate_at_minus_100_rejected() {
        let cfs = flows(&[dec!(100)]);
        assert!(npv(&cfs, dec!(-1), dec!(50)).is_err());
        assert!(npv(&cfs, dec!(-1.5), dec!(50)).is_err());
    }

    #[test]
    fn test_negative_rate_above_minus_100_allowed() {
        let cfs = flows(&[dec!(100)]);
        let result = npv(&cfs, dec!(-0.5), dec!(100)).unwrap();
        assert_eq!(result, dec!(100));
    }

    #[test]
    fn test_huge_rate_terms_vanish() {
        let cfs = flows(&[dec!(100); 60]);
        let result = npv(&cfs, dec!(10), dec!(100)).unwrap();
        // Only the first few periods carry any weight at 1000%.
        assert!(result < dec!(0));
        assert!(result > dec!(-100));
    }

    #[test]
    fn test_sum_overflow_is_an_error() {
        let big = dec!(70000000000000000000000000000);
        let cfs = flows(&[big, big]);
        let err = npv(&cfs, Decimal::ZERO, dec!(1000)).unwrap_err();
        assert!(matches!(err, InvestmentMetricsError::FinancialImpossibility(_)));
    }
}
