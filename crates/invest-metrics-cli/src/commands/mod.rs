pub mod capital_budgeting;
pub mod heuristics;
