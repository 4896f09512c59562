//! Exposure warning types and severity levels.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a risk alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskSeverity {
    /// Mandate or concentration limit breached.
    Warning,
    /// The book is no longer market neutral.
    Critical,
}

/// Grouping dimension of a concentration breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConcentrationDimension {
    Sector,
    Country,
    Currency,
}

impl fmt::Display for ConcentrationDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConcentrationDimension::Sector => "Sector",
            ConcentrationDimension::Country => "Country",
            ConcentrationDimension::Currency => "Currency",
        };
        write!(f, "{}", s)
    }
}

/// Discriminant for the kind of risk alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskAlertKind {
    /// Value-weighted portfolio beta outside the neutral band.
    BetaNeutralityBreached { portfolio_beta: Decimal, limit: Decimal },
    /// Net exposure over GMV outside the neutral band.
    NetExposureBreached { net_to_gmv: Decimal, limit: Decimal },
    /// One sector, country or currency holds too much of GMV.
    ConcentrationExceeded {
        dimension: ConcentrationDimension,
        name: String,
        pct_of_gmv: Decimal,
        limit: Decimal,
    },
    /// A single position is too large.
    SingleNameConcentration {
        ticker: String,
        dollar_weight: Decimal,
        limit: Decimal,
    },
    /// Large positions that would take too long to unwind.
    IlliquidLargePositions { count: usize, days_limit: Decimal },
    /// Positions left out of every aggregate for lack of a currency or FX rate.
    UnresolvedCurrency { tickers: Vec<String> },
}

/// A single warning emitted by the exposure monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
    pub severity: RiskSeverity,
    pub kind: RiskAlertKind,
    pub message: String,
}

impl RiskAlert {
    /// Create a new alert.
    pub fn new(severity: RiskSeverity, kind: RiskAlertKind, message: String) -> Self {
        Self {
            severity,
            kind,
            message,
        }
    }
}
