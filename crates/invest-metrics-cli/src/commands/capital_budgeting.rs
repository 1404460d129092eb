use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use invest_metrics_core::capital_budgeting::npv_profile::{self, NpvProfileInput};
use invest_metrics_core::capital_budgeting::{
    self as cb, FinancialInputs, IrrSolverConfig,
};
use invest_metrics_core::types::{to_percent, SensitivityVariable};

use crate::input;

/// Project description shared by the single-metric commands
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Up-front investment at period 0
    #[arg(long)]
    pub investment: Option<Decimal>,

    /// Discount rate as a decimal (0.10 = 10%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Project duration in years
    #[arg(long)]
    pub years: Option<u32>,

    /// Flat annual cash inflow
    #[arg(long)]
    pub inflow: Option<Decimal>,

    /// Recurring annual cash outflow
    #[arg(long)]
    pub outflow: Option<Decimal>,
}

impl ProjectArgs {
    /// Load from `--input` or stdin, else build from flags; always validated.
    fn resolve(&self) -> Result<FinancialInputs, Box<dyn std::error::Error>> {
        let inputs = match input::load(self.input.as_deref())? {
            Some(inputs) => inputs,
            None => self.inputs_from_flags()?,
        };
        inputs.validate()?;
        Ok(inputs)
    }

    fn inputs_from_flags(&self) -> Result<FinancialInputs, Box<dyn std::error::Error>> {
        Ok(FinancialInputs {
            initial_investment: self
                .investment
                .ok_or("--investment is required (or provide --input)")?,
            discount_rate: self.rate.ok_or("--rate is required (or provide --input)")?,
            project_duration: self.years.ok_or("--years is required (or provide --input)")?,
            annual_cash_inflow: self
                .inflow
                .ok_or("--inflow is required (or provide --input)")?,
            annual_cash_outflow: self.outflow,
            yearly_breakdown: None,
            solver: None,
        })
    }
}

/// Arguments for the full metrics evaluation
#[derive(Args)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = args.project.resolve()?;
    let result = cb::calculate_financial_metrics(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for NPV
#[derive(Args)]
pub struct NpvArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

pub fn run_npv(args: NpvArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = args.project.resolve()?;
    let flows = cb::project_cash_flows(&inputs)?;
    let value = cb::npv(&flows, inputs.discount_rate, inputs.initial_investment)?;
    Ok(json!({
        "result": {
            "npv": value,
            "discount_rate": inputs.discount_rate,
            "periods": flows.len(),
        }
    }))
}

/// Arguments for IRR
#[derive(Args)]
pub struct IrrArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Starting rate for the search
    #[arg(long)]
    pub guess: Option<Decimal>,

    /// Absolute NPV tolerance
    #[arg(long)]
    pub tolerance: Option<Decimal>,

    /// Iteration cap
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = args.project.resolve()?;
    let mut config: IrrSolverConfig = inputs.solver.clone().unwrap_or_default();
    if let Some(guess) = args.guess {
        config.initial_guess = guess;
    }
    if let Some(tolerance) = args.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }

    let flows = cb::project_cash_flows(&inputs)?;
    let solution = cb::irr_with_config(&flows, inputs.initial_investment, &config)?;
    Ok(json!({
        "result": {
            "irr": solution.converged.then(|| to_percent(solution.rate)),
            "rate": solution.rate,
            "converged": solution.converged,
            "iterations": solution.iterations,
            "termination": solution.termination,
        }
    }))
}

/// Arguments for payback period
#[derive(Args)]
pub struct PaybackArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
}

pub fn run_payback(args: PaybackArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = args.project.resolve()?;
    let flows = cb::project_cash_flows(&inputs)?;
    let payback = cb::payback_period(&flows, inputs.initial_investment)?;
    Ok(json!({
        "result": {
            "payback_period": payback.years(),
            "within_horizon": payback.is_within_horizon(),
            "status": payback,
        }
    }))
}

/// Arguments for the NPV profile sweep
#[derive(Args)]
pub struct NpvProfileArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Lowest discount rate in the sweep
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub min_rate: Decimal,

    /// Highest discount rate in the sweep
    #[arg(long, default_value = "0.30")]
    pub max_rate: Decimal,

    /// Sweep increment
    #[arg(long, default_value = "0.02")]
    pub step: Decimal,
}

pub fn run_npv_profile(args: NpvProfileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let profile_input: NpvProfileInput =
        if let Some(data) = input::load::<NpvProfileInput>(args.project.input.as_deref())? {
            data
        } else {
            NpvProfileInput {
                inputs: args.project.resolve()?,
                rates: SensitivityVariable {
                    name: "discount_rate".into(),
                    min: args.min_rate,
                    max: args.max_rate,
                    step: args.step,
                },
            }
        };
    let result = npv_profile::calculate_npv_profile(&profile_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;

    fn flag_args() -> ProjectArgs {
        ProjectArgs {
            input: None,
            investment: Some(dec!(500000)),
            rate: Some(dec!(0.10)),
            years: Some(10),
            inflow: Some(dec!(75000)),
            outflow: None,
        }
    }

    fn write_input(name: &str, body: &str) -> String {
        let path = std::env::temp_dir().join(format!("invm-{}-{name}", std::process::id()));
        fs::write(&path, body).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_file_input_is_validated() {
        let path = write_input(
            "zero-duration.json",
            r#"{"initial_investment": "1000", "discount_rate": "0.1",
                "project_duration": 0, "annual_cash_inflow": "400"}"#,
        );
        let args = ProjectArgs {
            input: Some(path.clone()),
            ..flag_args()
        };
        let err = args.resolve().unwrap_err();
        fs::remove_file(&path).ok();
        assert!(err.to_string().contains("project_duration"), "{err}");
    }

    #[test]
    fn test_npv_command_rejects_negative_inflow() {
        let path = write_input(
            "negative-inflow.json",
            r#"{"initial_investment": "1000", "discount_rate": "0.1",
                "project_duration": 3, "annual_cash_inflow": "-400"}"#,
        );
        let result = run_npv(NpvArgs {
            project: ProjectArgs {
                input: Some(path.clone()),
                ..flag_args()
            },
        });
        fs::remove_file(&path).ok();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("annual_cash_inflow"), "{err}");
    }

    #[test]
    fn test_flag_inputs_pass_validation() {
        let inputs = flag_args().inputs_from_flags().unwrap();
        assert!(inputs.validate().is_ok());

        let mut args = flag_args();
        args.years = Some(4_000_000_000);
        let inputs = args.inputs_from_flags().unwrap();
        assert!(inputs.validate().is_err());
    }
}
