mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::lease::LeaseArgs;

/// IFRS 16 lease liability calculator
#[derive(Parser)]
#[command(
    name = "lease-calc",
    version,
    about = "IFRS 16 lease liability and amortisation schedules",
    long_about = "Computes the present value of a lease liability and its period-by-period \
                  amortisation schedule with decimal precision. Supports monthly, quarterly \
                  and yearly payments, annual rent escalation, and mid-term modifications \
                  supplied in a JSON or YAML contract file."
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
    /// Present value of the lease liability at commencement
    PresentValue(LeaseArgs),
    /// Full amortisation schedule with remeasurements
    Schedule(LeaseArgs),
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
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::PresentValue(args) => commands::lease::run_present_value(args),
        Commands::Schedule(args) => commands::lease::run_schedule(args),
        Commands::Version => {
            println!("lease-calc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            cli.output.render(&value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("Calculation failed: {:?}", e);
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
