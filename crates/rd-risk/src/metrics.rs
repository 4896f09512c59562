//! Risk metrics computation.
//!
//! [`RiskMetricsCalculator`] reads a [`ValuedPortfolio`] and produces the
//! analytical content of the daily report: exposure summary, beta exposures,
//! the market shock scenario, concentration breakdowns and liquidity
//! statistics. It never modifies the valuation columns; shock P&L lives only in
//! the scenario rows it returns.

use std::collections::BTreeMap;

use rd_types::{Side, UnwindHorizon, ValuedPortfolio, ValuedPosition};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::RiskThresholds;

/// Portfolio-level exposure and P&L totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub long_count: usize,
    pub short_count: usize,
    /// Valued positions only.
    pub total_positions: usize,
    /// Positions left out because their currency could not be resolved.
    pub excluded_positions: usize,
    /// Long count over short count, with the short count floored at one.
    pub long_short_ratio: Decimal,

    pub total_gmv: Decimal,
    /// Sum of positive USD values.
    pub long_exposure: Decimal,
    /// Sum of negative USD values (reported as a negative number).
    pub short_exposure: Decimal,
    pub net_exposure: Decimal,
    pub net_to_gmv: Decimal,

    pub total_unrealized_pnl: Decimal,
    pub pnl_to_gmv: Decimal,
}

/// Value-weighted beta, normalised by total GMV for every book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorExposure {
    pub portfolio_beta: Decimal,
    pub long_beta: Decimal,
    pub short_beta: Decimal,
}

/// One position's result under the market shock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockPnl {
    pub ticker: String,
    pub name: String,
    pub beta: Decimal,
    pub position_value_usd: Decimal,
    pub dollar_weight: Decimal,
    pub shock_pnl: Decimal,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockScenario {
    pub market_move: Decimal,
    pub total_pnl: Decimal,
    pub pnl_to_gmv: Decimal,
    /// Most negative shock P&L first.
    pub worst_positions: Vec<ShockPnl>,
    /// Every position with |beta| above the cutoff, highest beta first.
    pub high_beta_positions: Vec<ShockPnl>,
    pub high_beta_cutoff: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPosition {
    pub ticker: String,
    pub name: String,
    pub country: String,
    pub sector: String,
    pub position_value_usd: Decimal,
    pub dollar_weight: Decimal,
    pub side: Side,
}

/// Aggregated exposure of one sector, country or currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupExposure {
    pub key: String,
    pub net_exposure_usd: Decimal,
    pub gross_exposure_usd: Decimal,
    pub unrealized_pnl_usd: Decimal,
    /// Gross exposure over total GMV.
    pub pct_of_gmv: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationBreakdown {
    pub top_positions: Vec<TopPosition>,
    pub by_sector: Vec<GroupExposure>,
    pub by_country: Vec<GroupExposure>,
    pub by_currency: Vec<GroupExposure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlliquidPosition {
    pub ticker: String,
    pub name: String,
    pub country: String,
    pub shares: Decimal,
    pub avg_daily_volume: Decimal,
    pub days_to_unwind: UnwindHorizon,
    pub position_value_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityStats {
    pub mean_days: UnwindHorizon,
    pub median_days: UnwindHorizon,
    pub max_days: UnwindHorizon,
    pub watch_days: Decimal,
    /// Positions slower to unwind than `watch_days`, slowest first.
    pub illiquid_positions: Vec<IlliquidPosition>,
}

/// Everything the report shows apart from the warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRiskSnapshot {
    pub summary: PortfolioSummary,
    pub factors: FactorExposure,
    pub shock: ShockScenario,
    pub concentration: ConcentrationBreakdown,
    pub liquidity: LiquidityStats,
}

/// Stateless calculator for risk metrics.
pub struct RiskMetricsCalculator;

impl RiskMetricsCalculator {
    pub fn compute(portfolio: &ValuedPortfolio, thresholds: &RiskThresholds) -> PortfolioRiskSnapshot {
        PortfolioRiskSnapshot {
            summary: Self::summary(portfolio),
            factors: Self::factor_exposure(portfolio),
            shock: Self::shock_scenario(portfolio, thresholds),
            concentration: Self::concentration(portfolio, thresholds.top_positions),
            liquidity: Self::liquidity(portfolio, thresholds.liquidity_watch_days),
        }
    }

    pub fn summary(portfolio: &ValuedPortfolio) -> PortfolioSummary {
        let gmv = portfolio.total_gmv;
        let long_count = portfolio.longs().count();
        let short_count = portfolio.shorts().count();

        let values = portfolio.positions.iter().map(|p| p.position_value_usd);
        let long_exposure: Decimal = values.clone().filter(|v| *v > Decimal::ZERO).sum();
        let short_exposure: Decimal = values.clone().filter(|v| *v < Decimal::ZERO).sum();
        let net_exposure: Decimal = values.sum();
        let total_unrealized_pnl: Decimal = portfolio.positions.iter().map(|p| p.unrealized_pnl_usd).sum();

        PortfolioSummary {
            long_count,
            short_count,
            total_positions: portfolio.len(),
            excluded_positions: portfolio.unresolved.len(),
            long_short_ratio: Decimal::from(long_count) / Decimal::from(short_count.max(1)),
            total_gmv: gmv,
            long_exposure,
            short_exposure,
            net_exposure,
            net_to_gmv: net_exposure / gmv,
            total_unrealized_pnl,
            pnl_to_gmv: total_unrealized_pnl / gmv,
        }
    }

    pub fn factor_exposure(portfolio: &ValuedPortfolio) -> FactorExposure {
        let gmv = portfolio.total_gmv;
        let beta_dollars = |p: &ValuedPosition| p.beta() * p.position_value_usd;

        FactorExposure {
            portfolio_beta: portfolio.positions.iter().map(beta_dollars).sum::<Decimal>() / gmv,
            long_beta: portfolio.longs().map(beta_dollars).sum::<Decimal>() / gmv,
            short_beta: portfolio.shorts().map(beta_dollars).sum::<Decimal>() / gmv,
        }
    }

    pub fn shock_scenario(portfolio: &ValuedPortfolio, thresholds: &RiskThresholds) -> ShockScenario {
        let market_move = thresholds.market_shock;
        let rows: Vec<ShockPnl> = portfolio
            .positions
            .iter()
            .map(|p| ShockPnl {
                ticker: p.position.ticker.clone(),
                name: p.position.name.clone(),
                beta: p.beta(),
                position_value_usd: p.position_value_usd,
                dollar_weight: p.dollar_weight,
                shock_pnl: p.beta() * market_move * p.position_value_usd,
                side: p.side,
            })
            .collect();

        let total_pnl: Decimal = rows.iter().map(|r| r.shock_pnl).sum();

        let mut worst_positions = rows.clone();
        worst_positions.sort_by(|a, b| a.shock_pnl.cmp(&b.shock_pnl));
        worst_positions.truncate(thresholds.worst_in_shock);

        let mut high_beta_positions: Vec<ShockPnl> = rows
            .into_iter()
            .filter(|r| r.beta.abs() > thresholds.high_beta_cutoff)
            .collect();
        high_beta_positions.sort_by(|a, b| b.beta.cmp(&a.beta));

        ShockScenario {
            market_move,
            total_pnl,
            pnl_to_gmv: total_pnl / portfolio.total_gmv,
            worst_positions,
            high_beta_positions,
            high_beta_cutoff: thresholds.high_beta_cutoff,
        }
    }

    pub fn concentration(portfolio: &ValuedPortfolio, top_n: usize) -> ConcentrationBreakdown {
        let mut ranked: Vec<&ValuedPosition> = portfolio.positions.iter().collect();
        ranked.sort_by(|a, b| b.dollar_weight.cmp(&a.dollar_weight));

        let top_positions = ranked
            .into_iter()
            .take(top_n)
            .map(|p| TopPosition {
                ticker: p.position.ticker.clone(),
                name: p.position.name.clone(),
                country: p.position.country.clone(),
                sector: p.position.sector.clone(),
                position_value_usd: p.position_value_usd,
                dollar_weight: p.dollar_weight,
                side: p.side,
            })
            .collect();

        ConcentrationBreakdown {
            top_positions,
            by_sector: Self::group_exposure(portfolio, |p| &p.position.sector),
            by_country: Self::group_exposure(portfolio, |p| &p.position.country),
            by_currency: Self::group_exposure(portfolio, |p| &p.currency),
        }
    }

    /// Aggregate by `key`, ranked by share of GMV. Ties keep alphabetical order.
    pub fn group_exposure<F>(portfolio: &ValuedPortfolio, key: F) -> Vec<GroupExposure>
    where
        F: Fn(&ValuedPosition) -> &String,
    {
        let mut groups: BTreeMap<&str, GroupExposure> = BTreeMap::new();

        for p in &portfolio.positions {
            let k = key(p);
            let group = groups.entry(k.as_str()).or_insert_with(|| GroupExposure {
                key: k.clone(),
                net_exposure_usd: Decimal::ZERO,
                gross_exposure_usd: Decimal::ZERO,
                unrealized_pnl_usd: Decimal::ZERO,
                pct_of_gmv: Decimal::ZERO,
            });
            group.net_exposure_usd += p.position_value_usd;
            group.gross_exposure_usd += p.position_value_usd.abs();
            group.unrealized_pnl_usd += p.unrealized_pnl_usd;
        }

        let mut exposures: Vec<GroupExposure> = groups
            .into_values()
            .map(|mut g| {
                g.pct_of_gmv = g.gross_exposure_usd / portfolio.total_gmv;
                g
            })
            .collect();
        exposures.sort_by(|a, b| b.pct_of_gmv.abs().cmp(&a.pct_of_gmv.abs()));
        exposures
    }

    pub fn liquidity(portfolio: &ValuedPortfolio, watch_days: Decimal) -> LiquidityStats {
        let mut horizons: Vec<UnwindHorizon> = portfolio.positions.iter().map(|p| p.days_to_unwind).collect();
        horizons.sort();

        let mut illiquid_positions: Vec<IlliquidPosition> = portfolio
            .positions
            .iter()
            .filter(|p| p.days_to_unwind.exceeds(watch_days))
            .map(|p| IlliquidPosition {
                ticker: p.position.ticker.clone(),
                name: p.position.name.clone(),
                country: p.position.country.clone(),
                shares: p.position.shares,
                avg_daily_volume: p.position.avg_daily_volume,
                days_to_unwind: p.days_to_unwind,
                position_value_usd: p.position_value_usd,
            })
            .collect();
        illiquid_positions.sort_by(|a, b| b.days_to_unwind.cmp(&a.days_to_unwind));

        LiquidityStats {
            mean_days: Self::mean(&horizons),
            median_days: Self::median(&horizons),
            max_days: horizons.last().copied().unwrap_or(UnwindHorizon::Days(Decimal::ZERO)),
            watch_days,
            illiquid_positions,
        }
    }

    fn mean(horizons: &[UnwindHorizon]) -> UnwindHorizon {
        if horizons.is_empty() {
            return UnwindHorizon::Days(Decimal::ZERO);
        }
        let mut total = Decimal::ZERO;
        for h in horizons {
            match h.days() {
                Some(d) => total += d,
                None => return UnwindHorizon::Unbounded,
            }
        }
        UnwindHorizon::Days(total / Decimal::from(horizons.len()))
    }

    /// Median of an already sorted slice.
    fn median(sorted: &[UnwindHorizon]) -> UnwindHorizon {
        let n = sorted.len();
        if n == 0 {
            return UnwindHorizon::Days(Decimal::ZERO);
        }
        if n % 2 == 1 {
            return sorted[n / 2];
        }
        match (sorted[n / 2 - 1].days(), sorted[n / 2].days()) {
            (Some(a), Some(b)) => UnwindHorizon::Days((a + b) / Decimal::TWO),
            _ => UnwindHorizon::Unbounded,
        }
    }
}
