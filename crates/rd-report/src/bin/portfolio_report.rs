//! Daily risk report for the factor neutral global equities book.
//!
//! ```bash
//! portfolio-report positions.csv fx_rates.csv
//! ```
//!
//! The report goes to stdout and to `portfolio_risk_report.txt` in the
//! working directory. Logs go to stderr (`RUST_LOG` overrides the `info`
//! default).

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use rd_report::{generate_report, save_report, OUTPUT_FILE};
use rd_risk::RiskThresholds;
use rd_types::{DataError, RdError};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "portfolio-report")]
#[command(version, about = "Daily risk report for a factor neutral global equities portfolio")]
struct Cli {
    /// Positions CSV file
    positions: PathBuf,

    /// FX rates CSV file (currency, to_USD)
    fx_rates: PathBuf,
}

fn run(cli: &Cli) -> Result<()> {
    let thresholds = RiskThresholds::from_env().context("Failed to load risk thresholds")?;
    let generated_at = chrono::Local::now().naive_local();

    let report = generate_report(&cli.positions, &cli.fx_rates, &thresholds, generated_at)?;

    save_report(OUTPUT_FILE, &report).with_context(|| format!("Failed to write {}", OUTPUT_FILE))?;
    print!("{}", report);
    info!("Report saved to: {}", OUTPUT_FILE);

    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<RdError>() {
                Some(RdError::Data(DataError::FileNotFound { path })) => {
                    eprintln!("Error: Could not find file - {}", path);
                }
                Some(RdError::Data(e)) if e.is_malformed_input() => {
                    eprintln!("Error: Malformed input - {}", e);
                }
                _ => eprintln!("Error generating report: {:?}", err),
            }
            ExitCode::FAILURE
        }
    }
}
