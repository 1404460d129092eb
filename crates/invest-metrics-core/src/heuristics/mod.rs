//! Default assumptions for proposals that do not state a discount rate or an
//! expected inflow, keyed by business-case tag.

pub mod defaults;
pub mod proposal;

pub use defaults::{BusinessCaseProfile, HeuristicTable};
pub use proposal::{evaluate_proposal, InvestmentProposal, ProposalEvaluation};
