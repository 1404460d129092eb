use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::InvestmentMetricsError;
use crate::types::{Money, Rate};
use crate::InvestmentMetricsResult;

/// Risk/return assumptions attached to one business-case tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessCaseProfile {
    pub tag: String,
    /// Added to the base discount rate; stacks with other matching tags
    pub rate_adjustment: Rate,
    /// Replaces the baseline inflow multiplier when this is the first matching profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflow_multiplier: Option<Decimal>,
}

impl BusinessCaseProfile {
    pub fn new(tag: &str, rate_adjustment: Rate, inflow_multiplier: Option<Decimal>) -> Self {
        BusinessCaseProfile {
            tag: tag.to_string(),
            rate_adjustment,
            inflow_multiplier,
        }
    }

    fn matches(&self, tag: &str) -> bool {
        self.tag.trim().eq_ignore_ascii_case(tag.trim())
    }

    fn matches_any<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|tag| self.matches(tag.as_ref()))
    }
}

/// Lookup table for default discount rates and inflow estimates.
///
/// Profiles are checked in table order for the inflow multiplier; rate
/// adjustments of every distinct matching profile are summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicTable {
    pub base_rate: Rate,
    pub min_rate: Rate,
    pub max_rate: Rate,
    /// Annual inflow as a fraction of total investment when no profile overrides it
    pub base_inflow_multiplier: Decimal,
    /// Durations strictly above this receive the haircut
    pub long_duration_threshold: u32,
    pub long_duration_haircut: Decimal,
    pub profiles: Vec<BusinessCaseProfile>,
}

impl Default for HeuristicTable {
    fn default() -> Self {
        HeuristicTable {
            base_rate: dec!(0.10),
            min_rate: dec!(0.05),
            max_rate: dec!(0.25),
            base_inflow_multiplier: dec!(0.15),
            long_duration_threshold: 5,
            long_duration_haircut: dec!(0.9),
            profiles: vec![
                BusinessCaseProfile::new("Cost Control", dec!(-0.01), Some(dec!(0.20))),
                BusinessCaseProfile::new("ESG", dec!(0.02), Some(dec!(0.12))),
                BusinessCaseProfile::new("IPO Preparation", dec!(0.03), Some(dec!(0.18))),
            ],
        }
    }
}

impl HeuristicTable {
    /// Add a profile, replacing any existing profile with the same tag.
    pub fn with_profile(mut self, profile: BusinessCaseProfile) -> Self {
        match self.profiles.iter_mut().find(|p| p.matches(&profile.tag)) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        self
    }

    /// Base rate plus every matching adjustment, clamped to `[min_rate, max_rate]`.
    ///
    /// If a table sets `min_rate` above `max_rate`, `max_rate` wins.
    pub fn default_discount_rate<S: AsRef<str>>(&self, tags: &[S]) -> Rate {
        let rate = self
            .profiles
            .iter()
            .filter(|profile| profile.matches_any(tags))
            .fold(self.base_rate, |acc, profile| {
                acc.saturating_add(profile.rate_adjustment)
            });
        rate.max(self.min_rate).min(self.max_rate)
    }

    /// Estimated annual inflow for a proposal without one.
    pub fn estimated_annual_inflow<S: AsRef<str>>(
        &self,
        total_investment: Money,
        tags: &[S],
        project_duration: u32,
    ) -> InvestmentMetricsResult<Money> {
        let multiplier = self
            .profiles
            .iter()
            .filter(|profile| profile.matches_any(tags))
            .find_map(|profile| profile.inflow_multiplier)
            .unwrap_or(self.base_inflow_multiplier);

        let estimate = total_investment.checked_mul(multiplier);
        let estimate = if project_duration > self.long_duration_threshold {
            estimate.and_then(|e| e.checked_mul(self.long_duration_haircut))
        } else {
            estimate
        };
        estimate.ok_or_else(|| {
            InvestmentMetricsError::FinancialImpossibility(
                "estimated annual inflow overflows".into(),
            )
        })
    }
}
