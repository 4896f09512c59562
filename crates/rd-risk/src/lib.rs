//! Valuation and risk analytics for the daily portfolio risk report.
//!
//! Provides:
//! - Currency resolution and USD valuation of positions ([`ValuationEngine`])
//! - Exposure, beta, shock, concentration and liquidity metrics
//!   ([`RiskMetricsCalculator`])
//! - Threshold rules for unintended exposures ([`ExposureMonitor`])

pub mod alerts;
pub mod config;
pub mod metrics;
pub mod monitor;
pub mod valuation;

pub use alerts::{ConcentrationDimension, RiskAlert, RiskAlertKind, RiskSeverity};
pub use config::{RiskThresholds, THRESHOLDS_ENV_VAR};
pub use metrics::{
    ConcentrationBreakdown, FactorExposure, GroupExposure, IlliquidPosition, LiquidityStats,
    PortfolioRiskSnapshot, PortfolioSummary, RiskMetricsCalculator, ShockPnl, ShockScenario,
    TopPosition,
};
pub use monitor::ExposureMonitor;
pub use valuation::{resolve_currency, ResolvedCurrency, ValuationEngine};

use rd_types::{FxTable, Position, RdResult, ValuedPortfolio};

/// The valued portfolio together with everything derived from it.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    pub portfolio: ValuedPortfolio,
    pub snapshot: PortfolioRiskSnapshot,
    pub alerts: Vec<RiskAlert>,
}

/// Value the positions, compute the metrics and evaluate the warning rules.
pub fn assess(positions: &[Position], fx: &FxTable, thresholds: &RiskThresholds) -> RdResult<RiskAssessment> {
    let portfolio = ValuationEngine::new(thresholds.adv_participation_rate).value(positions, fx)?;
    let snapshot = RiskMetricsCalculator::compute(&portfolio, thresholds);
    let alerts = ExposureMonitor::new(thresholds.clone()).evaluate(&portfolio, &snapshot);

    Ok(RiskAssessment {
        portfolio,
        snapshot,
        alerts,
    })
}
