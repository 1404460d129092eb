use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::InvestmentMetricsError;
use crate::types::*;
use crate::InvestmentMetricsResult;

use super::cash_flows::{project_cash_flows, FinancialInputs};
use super::irr::{irr_with_config, IrrSolution};
use super::npv::npv;

const MAX_PROFILE_POINTS: usize = 1_000;

/// Input for an NPV-vs-discount-rate sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvProfileInput {
    /// Project whose cash flows are discounted; its own `discount_rate` is ignored
    pub inputs: FinancialInputs,
    /// Discount-rate sweep (fractions)
    pub rates: SensitivityVariable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpvProfilePoint {
    pub rate: Rate,
    pub npv: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpvProfileOutput {
    pub points: Vec<NpvProfilePoint>,
    /// Rate where NPV crosses zero, for reference against the sweep
    pub irr: IrrSolution,
}

/// Generate the sweep values from min to max with step, always including max.
fn generate_sweep_values(var: &SensitivityVariable) -> InvestmentMetricsResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(InvestmentMetricsError::invalid(
            format!("variable:{}", var.name),
            "Step must be positive",
        ));
    }
    if var.min > var.max {
        return Err(InvestmentMetricsError::invalid(
            format!("variable:{}", var.name),
            "Min must be <= max",
        ));
    }
    if var.min <= dec!(-1) {
        return Err(InvestmentMetricsError::invalid(
            format!("variable:{}", var.name),
            "Discount rates must be greater than -100%",
        ));
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        if values.len() >= MAX_PROFILE_POINTS {
            return Err(InvestmentMetricsError::invalid(
                format!("variable:{}", var.name),
                format!("Sweep exceeds {MAX_PROFILE_POINTS} points"),
            ));
        }
        values.push(current);
        match current.checked_add(var.step) {
            Some(next) => current = next,
            None => break,
        }
    }
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// NPV of the projected series at each rate of the sweep.
pub fn calculate_npv_profile(
    input: &NpvProfileInput,
) -> InvestmentMetricsResult<ComputationOutput<NpvProfileOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.inputs.validate()?;

    let rates = generate_sweep_values(&input.rates)?;
    let cash_flows = project_cash_flows(&input.inputs)?;
    let investment = input.inputs.initial_investment;

    let points = rates
        .into_iter()
        .map(|rate| {
            npv(&cash_flows, rate, investment).map(|value| NpvProfilePoint { rate, npv: value })
        })
        .collect::<InvestmentMetricsResult<Vec<_>>>()?;

    let solver = input.inputs.solver.clone().unwrap_or_default();
    let irr = irr_with_config(&cash_flows, investment, &solver)?;
    if !irr.converged {
        warnings.push(format!(
            "IRR did not converge; best estimate {}%",
            to_percent(irr.rate).round_dp(4)
        ));
    }

    let output = NpvProfileOutput { points, irr };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "NPV profile across discount rates",
        &serde_json::json!({
            "initial_investment": investment.to_string(),
            "project_duration": input.inputs.project_duration,
            "rate_min": input.rates.min.to_string(),
            "rate_max": input.rates.max.to_string(),
            "rate_step": input.rates.step.to_string(),
        }),
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile_input(min: Decimal, max: Decimal, step: Decimal) -> NpvProfileInput {
        NpvProfileInput {
            inputs: FinancialInputs {
                initial_investment: dec!(500000),
                discount_rate: dec!(0.10),
                project_duration: 10,
                annual_cash_inflow: dec!(75000),
                annual_cash_outflow: None,
                yearly_breakdown: None,
                solver: None,
            },
            rates: SensitivityVariable {
                name: "discount_rate".into(),
                min,
                max,
                step,
            },
        }
    }

    #[test]
    fn test_profile_includes_endpoints() {
        let out = calculate_npv_profile(&profile_input(dec!(0), dec!(0.25), dec!(0.1))).unwrap();
        let rates: Vec<Decimal> = out.result.points.iter().map(|p| p.rate).collect();
        assert_eq!(rates, vec![dec!(0), dec!(0.1), dec!(0.2), dec!(0.25)]);
        assert_eq!(out.result.points[0].npv, dec!(250000));
    }

    #[test]
    fn test_profile_decreasing_and_brackets_irr() {
        let out = calculate_npv_profile(&profile_input(dec!(0), dec!(0.2), dec!(0.02))).unwrap();
        let points = &out.result.points;
        for pair in points.windows(2) {
            assert!(pair[1].npv < pair[0].npv);
        }
        let crossing = points
            .windows(2)
            .find(|w| w[0].npv > Decimal::ZERO && w[1].npv <= Decimal::ZERO)
            .unwrap();
        let irr = out.result.irr.rate;
        assert!(crossing[0].rate < irr && irr <= crossing[1].rate);
    }

    #[test]
    fn test_profile_rejects_bad_sweep() {
        assert!(calculate_npv_profile(&profile_input(dec!(0), dec!(0.2), dec!(0))).is_err());
        assert!(calculate_npv_profile(&profile_input(dec!(0.3), dec!(0.2), dec!(0.1))).is_err());
        assert!(calculate_npv_profile(&profile_input(dec!(-1), dec!(0.2), dec!(0.1))).is_err());
        assert!(
            calculate_npv_profile(&profile_input(dec!(0), dec!(10), dec!(0.0001))).is_err()
        );
    }

    #[test]
    fn test_profile_validates_project_inputs() {
        let mut input = profile_input(dec!(0), dec!(0.2), dec!(0.1));
        input.inputs.annual_cash_inflow = dec!(-75000);
        let err = calculate_npv_profile(&input).unwrap_err();
        assert!(err.to_string().contains("annual_cash_inflow"));

        let mut input = profile_input(dec!(0), dec!(0.2), dec!(0.1));
        input.inputs.project_duration = 4_000_000_000;
        let err = calculate_npv_profile(&input).unwrap_err();
        assert!(err.to_string().contains("project_duration"));
    }
}
