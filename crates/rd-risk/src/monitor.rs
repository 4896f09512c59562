//! Exposure monitor: threshold rules evaluated against the computed metrics.
//!
//! Each rule independently yields at most one [`RiskAlert`]. The monitor only
//! reads the portfolio and snapshot; it never recomputes the metrics.

use rd_types::{percent_points, ValuedPortfolio, ValuedPosition};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::alerts::{ConcentrationDimension, RiskAlert, RiskAlertKind, RiskSeverity};
use crate::config::RiskThresholds;
use crate::metrics::{GroupExposure, PortfolioRiskSnapshot};

/// Evaluates the unintended-exposure rules for a factor-neutral book.
#[derive(Debug, Clone, Default)]
pub struct ExposureMonitor {
    thresholds: RiskThresholds,
}

impl ExposureMonitor {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// Run every rule and return the alerts that fired, in rule order.
    pub fn evaluate(&self, portfolio: &ValuedPortfolio, snap: &PortfolioRiskSnapshot) -> Vec<RiskAlert> {
        let concentration = &snap.concentration;
        let alerts: Vec<RiskAlert> = [
            self.check_beta_neutrality(snap),
            self.check_net_exposure(snap),
            self.check_group(
                ConcentrationDimension::Sector,
                &concentration.by_sector,
                self.thresholds.sector_concentration_limit,
            ),
            self.check_group(
                ConcentrationDimension::Country,
                &concentration.by_country,
                self.thresholds.country_concentration_limit,
            ),
            self.check_group(
                ConcentrationDimension::Currency,
                &concentration.by_currency,
                self.thresholds.currency_concentration_limit,
            ),
            self.check_single_name(portfolio),
            self.check_illiquid_large(portfolio),
            self.check_unresolved(portfolio),
        ]
        .into_iter()
        .flatten()
        .collect();

        for alert in &alerts {
            self.emit(alert);
        }
        if alerts.is_empty() {
            info!("No significant unintended exposures detected");
        }

        alerts
    }

    fn check_beta_neutrality(&self, snap: &PortfolioRiskSnapshot) -> Option<RiskAlert> {
        let beta = snap.factors.portfolio_beta;
        let limit = self.thresholds.beta_neutral_limit;
        if beta.abs() <= limit {
            return None;
        }

        Some(RiskAlert::new(
            RiskSeverity::Critical,
            RiskAlertKind::BetaNeutralityBreached {
                portfolio_beta: beta,
                limit,
            },
            format!(
                "Portfolio beta ({:.4}) exceeds neutral threshold (±{})",
                beta.round_dp(4),
                limit.normalize(),
            ),
        ))
    }

    fn check_net_exposure(&self, snap: &PortfolioRiskSnapshot) -> Option<RiskAlert> {
        let net = snap.summary.net_to_gmv;
        let limit = self.thresholds.net_exposure_limit;
        if net.abs() <= limit {
            return None;
        }

        Some(RiskAlert::new(
            RiskSeverity::Warning,
            RiskAlertKind::NetExposureBreached {
                net_to_gmv: net,
                limit,
            },
            format!(
                "Net market exposure ({:.2}%) exceeds threshold (±{}%)",
                percent_points(net, 2),
                percent_points(limit, 2).normalize(),
            ),
        ))
    }

    /// `groups` arrive ranked by share of GMV, so the head is the largest.
    fn check_group(
        &self,
        dimension: ConcentrationDimension,
        groups: &[GroupExposure],
        limit: Decimal,
    ) -> Option<RiskAlert> {
        let top = groups.first()?;
        if top.pct_of_gmv <= limit {
            return None;
        }

        Some(RiskAlert::new(
            RiskSeverity::Warning,
            RiskAlertKind::ConcentrationExceeded {
                dimension,
                name: top.key.clone(),
                pct_of_gmv: top.pct_of_gmv,
                limit,
            },
            format!(
                "{} concentration ({:.2}%) in {} exceeds {}% limit",
                dimension,
                percent_points(top.pct_of_gmv, 2),
                top.key,
                percent_points(limit, 2).normalize(),
            ),
        ))
    }

    fn check_single_name(&self, portfolio: &ValuedPortfolio) -> Option<RiskAlert> {
        // First position wins ties
        let largest = portfolio
            .positions
            .iter()
            .fold(None::<&ValuedPosition>, |best, p| match best {
                Some(b) if b.dollar_weight >= p.dollar_weight => Some(b),
                _ => Some(p),
            })?;

        let limit = self.thresholds.single_name_limit;
        if largest.dollar_weight <= limit {
            return None;
        }

        Some(RiskAlert::new(
            RiskSeverity::Warning,
            RiskAlertKind::SingleNameConcentration {
                ticker: largest.ticker().to_string(),
                dollar_weight: largest.dollar_weight,
                limit,
            },
            format!(
                "Single name concentration ({:.2}%) in {}",
                percent_points(largest.dollar_weight, 2),
                largest.ticker(),
            ),
        ))
    }

    fn check_illiquid_large(&self, portfolio: &ValuedPortfolio) -> Option<RiskAlert> {
        let days_limit = self.thresholds.illiquid_days_limit;
        let min_weight = self.thresholds.illiquid_min_dollar_weight;

        let count = portfolio
            .positions
            .iter()
            .filter(|p| p.days_to_unwind.exceeds(days_limit) && p.dollar_weight > min_weight)
            .count();
        if count == 0 {
            return None;
        }

        Some(RiskAlert::new(
            RiskSeverity::Warning,
            RiskAlertKind::IlliquidLargePositions { count, days_limit },
            format!(
                "{} large positions require >{} days to unwind",
                count,
                days_limit.normalize(),
            ),
        ))
    }

    fn check_unresolved(&self, portfolio: &ValuedPortfolio) -> Option<RiskAlert> {
        if portfolio.unresolved.is_empty() {
            return None;
        }

        let tickers: Vec<String> = portfolio
            .unresolved
            .iter()
            .map(|u| u.position.ticker.clone())
            .collect();
        let message = format!(
            "{} positions excluded from all exposures: unresolved currency or FX rate ({})",
            tickers.len(),
            tickers.join(", "),
        );

        Some(RiskAlert::new(
            RiskSeverity::Warning,
            RiskAlertKind::UnresolvedCurrency { tickers },
            message,
        ))
    }

    fn emit(&self, alert: &RiskAlert) {
        match alert.severity {
            RiskSeverity::Critical => warn!(%alert.message, "RISK CRITICAL"),
            RiskSeverity::Warning => warn!(%alert.message, "RISK WARNING"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RiskMetricsCalculator;
    use crate::valuation::ValuationEngine;
    use rd_types::{FxTable, Position};
    use rust_decimal_macros::dec;

    fn pos(ticker: &str, sector: &str, country: &str, value: Decimal, beta: Decimal) -> Position {
        Position {
            ticker: ticker.into(),
            name: ticker.into(),
            country: country.into(),
            sector: sector.into(),
            currency: Some("USD".into()),
            shares: value,
            market_price_local: dec!(1),
            cost_basis_local: dec!(1),
            beta,
            avg_daily_volume: value.abs() * dec!(100),
        }
    }

    fn evaluate_with(positions: Vec<Position>, thresholds: RiskThresholds) -> Vec<RiskAlert> {
        let fx: FxTable = vec![("USD", dec!(1))].into_iter().collect();
        let portfolio = ValuationEngine::new(thresholds.adv_participation_rate)
            .value(&positions, &fx)
            .unwrap();
        let snap = RiskMetricsCalculator::compute(&portfolio, &thresholds);
        ExposureMonitor::new(thresholds).evaluate(&portfolio, &snap)
    }

    fn evaluate(positions: Vec<Position>) -> Vec<RiskAlert> {
        evaluate_with(positions, RiskThresholds::default())
    }

    /// Forty equal, beta-neutral names spread over many sectors and countries.
    fn diversified_book() -> Vec<Position> {
        (0..40)
            .map(|i| {
                let sign = if i % 2 == 0 { dec!(1) } else { dec!(-1) };
                pos(
                    &format!("T{}", i),
                    &format!("S{}", i % 10),
                    &format!("C{}", i % 10),
                    dec!(1000) * sign,
                    dec!(1),
                )
            })
            .collect()
    }

    fn sector_breach(alerts: &[RiskAlert]) -> Option<&RiskAlert> {
        alerts.iter().find(|a| {
            matches!(
                a.kind,
                RiskAlertKind::ConcentrationExceeded {
                    dimension: ConcentrationDimension::Sector,
                    ..
                }
            )
        })
    }

    #[test]
    fn clean_book_raises_nothing() {
        // Currency concentration is 100% USD, so lift that limit
        let thresholds = RiskThresholds {
            currency_concentration_limit: dec!(1),
            ..Default::default()
        };
        let alerts = evaluate_with(diversified_book(), thresholds);
        assert!(alerts.is_empty(), "unexpected alerts: {:?}", alerts);
    }

    #[test]
    fn offsetting_betas_do_not_breach_neutrality() {
        let alerts = evaluate(vec![
            pos("L", "Tech", "USA", dec!(5000), dec!(1.5)),
            pos("S", "Energy", "GBR", dec!(-5000), dec!(1.5)),
        ]);
        assert!(!alerts
            .iter()
            .any(|a| matches!(a.kind, RiskAlertKind::BetaNeutralityBreached { .. })));
    }

    #[test]
    fn beta_breach_is_critical() {
        let alerts = evaluate(vec![
            pos("L", "Tech", "USA", dec!(5000), dec!(1.5)),
            pos("S", "Energy", "GBR", dec!(-5000), dec!(0.5)),
        ]);
        let beta = alerts
            .iter()
            .find(|a| matches!(a.kind, RiskAlertKind::BetaNeutralityBreached { .. }))
            .expect("beta alert");
        assert_eq!(beta.severity, RiskSeverity::Critical);
        assert!(beta.message.contains("0.5000"));
        assert!(beta.message.contains("±0.1"));
    }

    #[test]
    fn net_exposure_breach() {
        let alerts = evaluate(vec![
            pos("L", "Tech", "USA", dec!(6000), dec!(0)),
            pos("S", "Energy", "GBR", dec!(-4000), dec!(0)),
        ]);
        let net = alerts
            .iter()
            .find(|a| matches!(a.kind, RiskAlertKind::NetExposureBreached { .. }))
            .expect("net exposure alert");
        assert!(net.message.contains("20.00%"));
    }

    fn sector_boundary_book(sector_value: Decimal) -> Vec<Position> {
        let rest = dec!(10000) - sector_value;
        vec![
            pos("A", "Tech", "C1", sector_value, dec!(0)),
            pos("B", "Energy", "C2", -dec!(2500), dec!(0)),
            pos("C", "Banks", "C3", dec!(2500), dec!(0)),
            pos("D", "Autos", "C4", -(rest - dec!(5000)), dec!(0)),
        ]
    }

    #[test]
    fn sector_threshold_is_strict() {
        let below = evaluate(sector_boundary_book(dec!(2999)));
        assert!(sector_breach(&below).is_none());

        let at = evaluate(sector_boundary_book(dec!(3000)));
        assert!(sector_breach(&at).is_none());

        let above = evaluate(sector_boundary_book(dec!(3001)));
        let alert = sector_breach(&above).expect("sector alert above 30%");
        assert!(alert.message.contains("30.01%"));
        assert!(alert.message.contains("Tech"));
    }

    #[test]
    fn country_uses_forty_percent_limit() {
        let book = |usa: Decimal| {
            vec![
                pos("A", "S1", "USA", usa, dec!(0)),
                pos("B", "S2", "GBR", -dec!(3000), dec!(0)),
                pos("C", "S3", "JPN", -(dec!(7000) - usa), dec!(0)),
            ]
        };
        let alerts = evaluate(book(dec!(3500)));
        assert!(!alerts.iter().any(|a| matches!(
            a.kind,
            RiskAlertKind::ConcentrationExceeded { dimension: ConcentrationDimension::Country, .. }
        )));

        let alerts = evaluate(book(dec!(4100)));
        assert!(alerts.iter().any(|a| matches!(
            a.kind,
            RiskAlertKind::ConcentrationExceeded { dimension: ConcentrationDimension::Country, ref name, .. } if name == "USA"
        )));
    }

    #[test]
    fn currency_concentration_names_currency() {
        let alerts = evaluate(diversified_book());
        let alert = alerts
            .iter()
            .find(|a| matches!(
                a.kind,
                RiskAlertKind::ConcentrationExceeded { dimension: ConcentrationDimension::Currency, .. }
            ))
            .expect("currency alert");
        assert!(alert.message.contains("USD"));
        assert!(alert.message.contains("100.00%"));
    }

    #[test]
    fn single_name_names_ticker() {
        let mut book = diversified_book();
        book.push(pos("BIG", "S0", "C0", dec!(4000), dec!(0)));
        let alerts = evaluate(book);

        let alert = alerts
            .iter()
            .find(|a| matches!(a.kind, RiskAlertKind::SingleNameConcentration { .. }))
            .expect("single name alert");
        assert!(alert.message.contains("BIG"));
    }

    #[test]
    fn illiquid_large_positions_need_weight_and_days() {
        // 1,000,000 shares against 1,000,000 ADV: exactly 10 days, not flagged
        let mut at_limit = pos("A", "S1", "USA", dec!(1_000_000), dec!(0));
        at_limit.avg_daily_volume = dec!(1_000_000);
        let mut slow = pos("B", "S2", "GBR", -dec!(1_000_000), dec!(0));
        slow.avg_daily_volume = dec!(500_000);

        let alerts = evaluate(vec![at_limit.clone(), slow]);
        match alerts
            .iter()
            .find(|a| matches!(a.kind, RiskAlertKind::IlliquidLargePositions { .. }))
            .map(|a| &a.kind)
        {
            Some(RiskAlertKind::IlliquidLargePositions { count, .. }) => assert_eq!(*count, 1),
            other => panic!("expected illiquid alert, got {:?}", other),
        }

        // Slow but tiny: below the 2% dollar-weight floor
        let mut tiny = pos("C", "S3", "JPN", dec!(100), dec!(0));
        tiny.avg_daily_volume = dec!(1);
        let mut book = diversified_book();
        book.push(tiny);
        let alerts = evaluate(book);
        assert!(!alerts
            .iter()
            .any(|a| matches!(a.kind, RiskAlertKind::IlliquidLargePositions { .. })));
    }

    #[test]
    fn unresolved_positions_are_reported() {
        let fx: FxTable = vec![("USD", dec!(1))].into_iter().collect();
        let mut orphan = pos("ORPH", "S1", "ZAF", dec!(1000), dec!(1));
        orphan.currency = None;
        let mut positions = diversified_book();
        positions.push(orphan);

        let thresholds = RiskThresholds::default();
        let portfolio = ValuationEngine::default().value(&positions, &fx).unwrap();
        let snap = RiskMetricsCalculator::compute(&portfolio, &thresholds);
        let alerts = ExposureMonitor::new(thresholds).evaluate(&portfolio, &snap);

        let alert = alerts
            .iter()
            .find(|a| matches!(a.kind, RiskAlertKind::UnresolvedCurrency { .. }))
            .expect("unresolved alert");
        assert!(alert.message.contains("ORPH"));
        assert_eq!(snap.summary.excluded_positions, 1);
    }
}
