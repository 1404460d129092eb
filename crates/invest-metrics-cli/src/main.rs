mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::capital_budgeting::{IrrArgs, MetricsArgs, NpvArgs, NpvProfileArgs, PaybackArgs};
use commands::heuristics::{DefaultsArgs, ProposalArgs};

/// Capital-budgeting metrics for investment requests
#[derive(Parser)]
#[command(
    name = "invm",
    version,
    about = "Capital-budgeting metrics for investment requests",
    long_about = "Computes NPV, IRR (Newton-Raphson), payback period and ROI for a \
                  proposed investment with decimal precision. Inputs come from a JSON \
                  or YAML file, piped stdin, or individual flags."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Full metrics (NPV, IRR, payback, ROI) for a project
    Metrics(MetricsArgs),
    /// Net present value of a project at its discount rate
    Npv(NpvArgs),
    /// Internal rate of return with solver diagnostics
    Irr(IrrArgs),
    /// Payback period
    Payback(PaybackArgs),
    /// NPV across a range of discount rates
    NpvProfile(NpvProfileArgs),
    /// Default discount rate and inflow estimate for business-case tags
    Defaults(DefaultsArgs),
    /// Evaluate a submitted investment proposal, filling gaps from defaults
    Proposal(ProposalArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Metrics(args) => commands::capital_budgeting::run_metrics(args),
        Commands::Npv(args) => commands::capital_budgeting::run_npv(args),
        Commands::Irr(args) => commands::capital_budgeting::run_irr(args),
        Commands::Payback(args) => commands::capital_budgeting::run_payback(args),
        Commands::NpvProfile(args) => commands::capital_budgeting::run_npv_profile(args),
        Commands::Defaults(args) => commands::heuristics::run_defaults(args),
        Commands::Proposal(args) => commands::heuristics::run_proposal(args),
        Commands::Version => {
            println!("invm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
