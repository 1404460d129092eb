use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use invest_metrics_core::heuristics::{evaluate_proposal, HeuristicTable, InvestmentProposal};

use crate::input;

/// Arguments for heuristic defaults lookup
#[derive(Args)]
pub struct DefaultsArgs {
    /// Business-case tags (comma-separated, e.g. "ESG,Cost Control")
    #[arg(long, value_delimiter = ',')]
    pub business_cases: Vec<String>,

    /// Total investment used for the inflow estimate
    #[arg(long)]
    pub investment: Option<Decimal>,

    /// Project duration in years
    #[arg(long, default_value = "1")]
    pub years: u32,

    /// Path to a JSON/YAML heuristic table replacing the built-in one
    #[arg(long)]
    pub table: Option<String>,
}

fn load_table(path: Option<&str>) -> Result<HeuristicTable, Box<dyn std::error::Error>> {
    match path {
        Some(path) => input::file::read_input(path),
        None => Ok(HeuristicTable::default()),
    }
}

pub fn run_defaults(args: DefaultsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = load_table(args.table.as_deref())?;
    let tags = args.business_cases.as_slice();
    let inflow = args
        .investment
        .map(|total| table.estimated_annual_inflow(total, tags, args.years))
        .transpose()?;
    Ok(json!({
        "result": {
            "discount_rate": table.default_discount_rate(tags),
            "annual_cash_inflow": inflow,
            "business_cases": tags,
        }
    }))
}

/// Arguments for proposal evaluation
#[derive(Args)]
pub struct ProposalArgs {
    /// Path to JSON/YAML proposal file
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON/YAML heuristic table replacing the built-in one
    #[arg(long)]
    pub table: Option<String>,
}

pub fn run_proposal(args: ProposalArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let proposal: InvestmentProposal = input::load(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for proposal")?;
    let table = load_table(args.table.as_deref())?;
    let result = evaluate_proposal(&proposal, &table)?;
    Ok(serde_json::to_value(result)?)
}
