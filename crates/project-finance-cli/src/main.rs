mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::cashflow::CfadsArgs;
use commands::coverage::CoverageArgs;
use commands::debt::DebtArgs;
use commands::evaluate::EvaluateArgs;

/// Cash flow, debt and coverage analysis for infrastructure project finance
#[derive(Parser)]
#[command(
    name = "pfm",
    version,
    about = "Cash flow, debt and coverage analysis for infrastructure project finance",
    long_about = "A CLI for project finance modelling with decimal precision. Builds the \
                  annual CFADS waterfall, sizes and sculpts multi-currency debt through \
                  construction and operations, and evaluates DSCR, LLCR and PLCR against \
                  lender covenants."
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
    /// Build the annual CFADS waterfall for a scenario
    Cfads(CfadsArgs),
    /// Size, draw and repay the senior debt
    Debt(DebtArgs),
    /// Loan and project life coverage ratios
    Coverage(CoverageArgs),
    /// Run CFADS, debt and coverage end to end
    Evaluate(EvaluateArgs),
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
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Cfads(args) => commands::cashflow::run_cfads(args),
        Commands::Debt(args) => commands::debt::run_debt(args),
        Commands::Coverage(args) => commands::coverage::run_coverage(args),
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args),
        Commands::Version => {
            println!("pfm {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
