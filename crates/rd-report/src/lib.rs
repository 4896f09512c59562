//! Daily risk report for a factor neutral global equities portfolio.
//!
//! Loads the positions and FX tables, runs the risk assessment and renders
//! the plain text report.

pub mod format;
pub mod report;

pub use report::{ReportFormatter, MAX_TABLE_ROWS, REPORT_WIDTH};

use std::path::Path;

use chrono::NaiveDateTime;
use rd_data::ReportInputs;
use rd_risk::{assess, RiskThresholds};
use rd_types::RdResult;
use tracing::info;

/// File the report is saved to, relative to the working directory.
pub const OUTPUT_FILE: &str = "portfolio_risk_report.txt";

/// Write the report text to `path`.
pub fn save_report<P: AsRef<Path>>(path: P, report: &str) -> RdResult<()> {
    std::fs::write(path, report)?;
    Ok(())
}

/// Load both inputs, assess the book and render the report text.
pub fn generate_report<P: AsRef<Path>, Q: AsRef<Path>>(
    positions_path: P,
    fx_path: Q,
    thresholds: &RiskThresholds,
    generated_at: NaiveDateTime,
) -> RdResult<String> {
    info!("Loading portfolio data...");
    let inputs = ReportInputs::load(positions_path, fx_path)?;
    info!(
        positions = inputs.positions.len(),
        currencies = inputs.fx_rates.len(),
        "Inputs loaded"
    );

    info!("Processing positions and calculating risk metrics...");
    let assessment = assess(&inputs.positions, &inputs.fx_rates, thresholds)?;
    info!(
        valued = assessment.portfolio.len(),
        excluded = assessment.portfolio.unresolved.len(),
        alerts = assessment.alerts.len(),
        "Risk assessment complete"
    );

    info!("Generating risk report...");
    Ok(ReportFormatter::new(generated_at).render(&assessment))
}
