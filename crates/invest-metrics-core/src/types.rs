use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::InvestmentMetricsResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Percentages (8.14 = 8.14%). Only used on reporting fields.
pub type Percent = Decimal;

/// Fractional period counts
pub type Years = Decimal;

/// Sweep specification for a single variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata. Fails only when the
/// assumptions cannot be rendered as JSON.
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> InvestmentMetricsResult<ComputationOutput<T>> {
    let assumptions = serde_json::to_value(assumptions)?;
    for warning in &warnings {
        log::warn!("{methodology}: {warning}");
    }
    Ok(ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions,
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    })
}

/// Convert a fractional rate to a percentage for reporting.
pub fn to_percent(rate: Rate) -> Percent {
    rate * Decimal::ONE_HUNDRED
}
