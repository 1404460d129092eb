use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use invest_metrics_core::capital_budgeting::npv_profile::{self, NpvProfileInput};
use invest_metrics_core::capital_budgeting::{self, FinancialInputs};
use invest_metrics_core::heuristics::{self, HeuristicTable, InvestmentProposal};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Heuristic table from JSON, or the built-in one when absent.
fn parse_table(table_json: Option<String>) -> NapiResult<HeuristicTable> {
    match table_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(HeuristicTable::default()),
    }
}

// ---------------------------------------------------------------------------
// Capital budgeting
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_financial_metrics(input_json: String) -> NapiResult<String> {
    let input: FinancialInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        capital_budgeting::calculate_financial_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_npv_profile(input_json: String) -> NapiResult<String> {
    let input: NpvProfileInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = npv_profile::calculate_npv_profile(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Heuristics and proposals
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_proposal(input_json: String, table_json: Option<String>) -> NapiResult<String> {
    let input: InvestmentProposal = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let table = parse_table(table_json)?;
    let output = heuristics::evaluate_proposal(&input, &table).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_discount_rate(tags: Vec<String>, table_json: Option<String>) -> NapiResult<String> {
    let table = parse_table(table_json)?;
    Ok(table.default_discount_rate(tags.as_slice()).to_string())
}

#[derive(Deserialize)]
struct InflowEstimateInput {
    total_investment: Decimal,
    #[serde(default)]
    business_cases: Vec<String>,
    project_duration: u32,
}

#[napi]
pub fn estimated_annual_inflow(
    input_json: String,
    table_json: Option<String>,
) -> NapiResult<String> {
    let input: InflowEstimateInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let table = parse_table(table_json)?;
    let estimate = table.estimated_annual_inflow(
        input.total_investment,
        input.business_cases.as_slice(),
        input.project_duration,
    )
    .map_err(to_napi_error)?;
    Ok(estimate.to_string())
}
