use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::InvestmentMetricsError;
use crate::types::{Money, Rate};
use crate::InvestmentMetricsResult;

use super::cash_flows::CashFlowPeriod;
use super::npv::discounted;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Tunable constants of the Newton-Raphson IRR search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrSolverConfig {
    /// Starting rate
    pub initial_guess: Rate,
    /// Absolute NPV (currency units) accepted as zero; also the floor on |NPV'|
    pub tolerance: Decimal,
    /// Hard cap on Newton steps
    pub max_iterations: u32,
    /// Exclusive lower bound of the search domain
    pub lower_bound: Rate,
    /// Inclusive upper bound of the search domain
    pub upper_bound: Rate,
}

impl Default for IrrSolverConfig {
    fn default() -> Self {
        IrrSolverConfig {
            initial_guess: dec!(0.10),
            tolerance: dec!(0.0001),
            max_iterations: 100,
            lower_bound: dec!(-1),
            upper_bound: dec!(10),
        }
    }
}

impl IrrSolverConfig {
    pub fn validate(&self) -> InvestmentMetricsResult<()> {
        if self.tolerance <= Decimal::ZERO {
            return Err(InvestmentMetricsError::invalid(
                "solver.tolerance",
                "Tolerance must be positive",
            ));
        }
        if self.lower_bound < dec!(-1) {
            return Err(InvestmentMetricsError::invalid(
                "solver.lower_bound",
                "Lower bound cannot be below -100%",
            ));
        }
        if self.upper_bound <= self.lower_bound {
            return Err(InvestmentMetricsError::invalid(
                "solver.upper_bound",
                "Upper bound must exceed lower bound",
            ));
        }
        if self.initial_guess <= self.lower_bound || self.initial_guess > self.upper_bound {
            return Err(InvestmentMetricsError::invalid(
                "solver.initial_guess",
                "Initial guess must lie inside the search domain",
            ));
        }
        Ok(())
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrrTermination {
    /// |NPV| fell below tolerance
    Converged,
    /// |NPV'| fell below tolerance; the tangent is too flat to step along
    FlatDerivative,
    /// The next step left the search domain (or the decimal range)
    OutOfDomain,
    /// Iteration cap reached
    MaxIterations,
}

/// Result of an IRR search. `rate` is always the best estimate found, even
/// when `converged` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrSolution {
    /// Fractional rate (0.0814 = 8.14%)
    pub rate: Rate,
    pub converged: bool,
    /// Newton steps taken
    pub iterations: u32,
    pub termination: IrrTermination,
}

impl IrrSolution {
    fn stop(rate: Rate, iterations: u32, termination: IrrTermination) -> Self {
        IrrSolution {
            rate,
            converged: termination == IrrTermination::Converged,
            iterations,
            termination,
        }
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// NPV and dNPV/dr at `rate`, or `None` if any term leaves the decimal range.
fn npv_and_derivative(
    cash_flows: &[CashFlowPeriod],
    rate: Rate,
    initial_investment: Money,
) -> Option<(Money, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv_val = -initial_investment;
    let mut dnpv = Decimal::ZERO;

    for cf in cash_flows {
        let t = i64::from(cf.period);
        let net = cf.net_flow;
        npv_val = npv_val.checked_add(discounted(net, one_plus_r, t)?)?;
        let slope = discounted(Decimal::from(t).checked_mul(net)?, one_plus_r, t + 1)?;
        dnpv = dnpv.checked_sub(slope)?;
    }

    Some((npv_val, dnpv))
}

/// Internal Rate of Return using Newton-Raphson with the default constants.
pub fn irr(
    cash_flows: &[CashFlowPeriod],
    initial_investment: Money,
) -> InvestmentMetricsResult<IrrSolution> {
    irr_with_config(cash_flows, initial_investment, &IrrSolverConfig::default())
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Non-convergence is not an error: the search stops at the iteration cap, on
/// a flat derivative or when a step would leave `(lower_bound, upper_bound]`,
/// and reports the last in-domain estimate. Only an invalid `config` fails.
pub fn irr_with_config(
    cash_flows: &[CashFlowPeriod],
    initial_investment: Money,
    config: &IrrSolverConfig,
) -> InvestmentMetricsResult<IrrSolution> {
    config.validate()?;

    let mut rate = config.initial_guess;

    for i in 0..config.max_iterations {
        let Some((npv_val, dnpv)) = npv_and_derivative(cash_flows, rate, initial_investment)
        else {
            log::debug!("IRR: NPV at {rate} overflows after {i} iterations");
            return Ok(IrrSolution::stop(rate, i, IrrTermination::OutOfDomain));
        };

        if npv_val.abs() < config.tolerance {
            return Ok(IrrSolution::stop(rate, i, IrrTermination::Converged));
        }

        if dnpv.abs() < config.tolerance {
            log::debug!("IRR: flat derivative at {rate} after {i} iterations");
            return Ok(IrrSolution::stop(rate, i, IrrTermination::FlatDerivative));
        }

        let next = npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step));
        match next {
            Some(next) if next > config.lower_bound && next <= config.upper_bound => rate = next,
            _ => {
                log::debug!("IRR: step from {rate} left the search domain after {i} iterations");
                return Ok(IrrSolution::stop(rate, i, IrrTermination::OutOfDomain));
            }
        }
    }

    log::debug!(
        "IRR: no convergence after {} iterations, best estimate {rate}",
        config.max_iterations
    );
    Ok(IrrSolution::stop(
        rate,
        config.max_iterations,
        IrrTermination::MaxIterations,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capital_budgeting::npv::npv;
    use rust_decimal_macros::dec;

    fn flat(net: Decimal, periods: u32) -> Vec<CashFlowPeriod> {
        (1..=periods)
            .map(|p| CashFlowPeriod::new(p, net, Decimal::ZERO).unwrap())
            .collect()
    }

    #[test]
    fn test_irr_basic() {
        let result = irr(&flat(dec!(400), 3), dec!(1000)).unwrap();
        // IRR should be ~9.7%
        assert!(result.converged);
        assert!((result.rate - dec!(0.097)).abs() < dec!(0.001));
    }

    #[test]
    fn test_irr_zeroes_npv() {
        let cfs = flat(dec!(75000), 10);
        let result = irr(&cfs, dec!(500000)).unwrap();
        assert!(result.converged);
        let residual = npv(&cfs, result.rate, dec!(500000)).unwrap();
        assert!(residual.abs() < dec!(0.0001));
    }

    #[test]
    fn test_converges_immediately_at_guess() {
        // 1100 received in period 1 on 1000 invested is exactly 10%.
        let cfs = flat(dec!(1100), 1);
        let result = irr(&cfs, dec!(1000)).unwrap();
        assert_eq!(result.iterations, 0);
        assert_eq!(result.rate, dec!(0.10));
        assert_eq!(result.termination, IrrTermination::Converged);
    }

    #[test]
    fn test_always_losing_project_does_not_error() {
        // Negative net flow every period: NPV never crosses zero.
        let cfs: Vec<CashFlowPeriod> = (1..=5)
            .map(|p| CashFlowPeriod::new(p, dec!(10), dec!(50)).unwrap())
            .collect();
        let result = irr(&cfs, dec!(1000)).unwrap();
        assert!(!result.converged);
        assert!(result.rate > dec!(-1));
        assert!(result.rate <= dec!(10));
    }

    #[test]
    fn test_iteration_cap_respected() {
        let config = IrrSolverConfig {
            max_iterations: 1,
            tolerance: dec!(0.0000000001),
            ..IrrSolverConfig::default()
        };
        let result = irr_with_config(&flat(dec!(75000), 10), dec!(500000), &config).unwrap();
        assert_eq!(result.termination, IrrTermination::MaxIterations);
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
    }

    #[test]
    fn test_zero_iterations_returns_guess() {
        let config = IrrSolverConfig {
            max_iterations: 0,
            ..IrrSolverConfig::default()
        };
        let result = irr_with_config(&flat(dec!(400), 3), dec!(1000), &config).unwrap();
        assert_eq!(result.rate, dec!(0.10));
        assert_eq!(result.termination, IrrTermination::MaxIterations);
    }

    #[test]
    fn test_flat_derivative_stops() {
        // No cash flows at all: NPV' is identically zero.
        let result = irr(&[], dec!(1000)).unwrap();
        assert_eq!(result.termination, IrrTermination::FlatDerivative);
        assert_eq!(result.rate, dec!(0.10));
    }

    #[test]
    fn test_out_of_domain_returns_previous_guess() {
        // True IRR is 1900%, above the 1000% ceiling.
        let config = IrrSolverConfig {
            initial_guess: dec!(9),
            ..IrrSolverConfig::default()
        };
        let result = irr_with_config(&flat(dec!(20000), 1), dec!(1000), &config).unwrap();
        assert_eq!(result.termination, IrrTermination::OutOfDomain);
        assert!(result.rate <= dec!(10));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad_tol = IrrSolverConfig {
            tolerance: Decimal::ZERO,
            ..IrrSolverConfig::default()
        };
        assert!(irr_with_config(&flat(dec!(400), 3), dec!(1000), &bad_tol).is_err());

        let bad_bounds = IrrSolverConfig {
            lower_bound: dec!(-2),
            ..IrrSolverConfig::default()
        };
        assert!(irr_with_config(&flat(dec!(400), 3), dec!(1000), &bad_bounds).is_err());

        let bad_guess = IrrSolverConfig {
            initial_guess: dec!(11),
            ..IrrSolverConfig::default()
        };
        assert!(irr_with_config(&flat(dec!(400), 3), dec!(1000), &bad_guess).is_err());
    }

    #[test]
    fn test_deterministic() {
        let cfs = flat(dec!(75000), 10);
        let a = irr(&cfs, dec!(500000)).unwrap();
        let b = irr(&cfs, dec!(500000)).unwrap();
        assert_eq!(a, b);
    }
}
