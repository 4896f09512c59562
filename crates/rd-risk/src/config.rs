//! Threshold configuration for the risk metrics and exposure warnings.

use std::path::Path;

use rd_types::{config_error, RdResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Environment variable naming an optional JSON file of threshold overrides.
pub const THRESHOLDS_ENV_VAR: &str = "RISK_REPORT_THRESHOLDS";

/// Limits and scenario parameters used by the metrics calculator and the
/// exposure monitor. All limit comparisons are strict (`>`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    /// Maximum absolute portfolio beta for a beta-neutral book.
    pub beta_neutral_limit: Decimal,
    /// Maximum absolute net exposure as a fraction of GMV.
    pub net_exposure_limit: Decimal,
    /// Maximum gross share of GMV in one sector.
    pub sector_concentration_limit: Decimal,
    /// Maximum gross share of GMV in one country.
    pub country_concentration_limit: Decimal,
    /// Maximum gross share of GMV in one currency.
    pub currency_concentration_limit: Decimal,
    /// Maximum dollar weight of a single name.
    pub single_name_limit: Decimal,
    /// Days to unwind beyond which a large position is flagged.
    pub illiquid_days_limit: Decimal,
    /// Minimum dollar weight for an illiquid position to be flagged.
    pub illiquid_min_dollar_weight: Decimal,
    /// Days to unwind beyond which a position is listed as illiquid.
    pub liquidity_watch_days: Decimal,
    /// Absolute beta beyond which a position is listed as high beta.
    pub high_beta_cutoff: Decimal,
    /// Market move applied in the shock scenario.
    pub market_shock: Decimal,
    /// Fraction of average daily volume that can be traded per day.
    pub adv_participation_rate: Decimal,
    /// Number of positions in the top-positions table.
    pub top_positions: usize,
    /// Number of positions in the worst-in-shock table.
    pub worst_in_shock: usize,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            beta_neutral_limit: Decimal::new(10, 2),           // 0.10
            net_exposure_limit: Decimal::new(10, 2),           // 10%
            sector_concentration_limit: Decimal::new(30, 2),   // 30%
            country_concentration_limit: Decimal::new(40, 2),  // 40%
            currency_concentration_limit: Decimal::new(30, 2), // 30%
            single_name_limit: Decimal::new(5, 2),             // 5%
            illiquid_days_limit: Decimal::from(10),
            illiquid_min_dollar_weight: Decimal::new(2, 2), // 2%
            liquidity_watch_days: Decimal::from(5),
            high_beta_cutoff: Decimal::from(2),
            market_shock: Decimal::new(2, 2), // +2%
            adv_participation_rate: Decimal::new(10, 2),
            top_positions: 10,
            worst_in_shock: 5,
        }
    }
}

impl RiskThresholds {
    /// Read thresholds from a JSON file. Fields missing from the file keep
    /// their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> RdResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| config_error!("Failed to read thresholds file {}: {}", path.display(), e))?;
        let thresholds: Self = serde_json::from_str(&contents)?;
        thresholds.validate()?;

        tracing::info!("Loaded risk thresholds from {}", path.display());
        Ok(thresholds)
    }

    /// Defaults, or the file named by [`THRESHOLDS_ENV_VAR`] when it is set.
    pub fn from_env() -> RdResult<Self> {
        match std::env::var_os(THRESHOLDS_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::from_json_file(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> RdResult<()> {
        let limits = [
            ("beta_neutral_limit", self.beta_neutral_limit),
            ("net_exposure_limit", self.net_exposure_limit),
            ("sector_concentration_limit", self.sector_concentration_limit),
            ("country_concentration_limit", self.country_concentration_limit),
            ("currency_concentration_limit", self.currency_concentration_limit),
            ("single_name_limit", self.single_name_limit),
            ("illiquid_days_limit", self.illiquid_days_limit),
            ("illiquid_min_dollar_weight", self.illiquid_min_dollar_weight),
            ("liquidity_watch_days", self.liquidity_watch_days),
            ("high_beta_cutoff", self.high_beta_cutoff),
        ];
        for (name, value) in limits {
            if value < Decimal::ZERO {
                return Err(config_error!("{} must not be negative, got {}", name, value));
            }
        }

        if self.adv_participation_rate <= Decimal::ZERO || self.adv_participation_rate > Decimal::ONE {
            return Err(config_error!(
                "adv_participation_rate must be in (0, 1], got {}",
                self.adv_participation_rate
            ));
        }

        if self.market_shock.abs() > Decimal::ONE {
            return Err(config_error!(
                "market_shock must be within [-1, 1], got {}",
                self.market_shock
            ));
        }

        Ok(())
    }
}
