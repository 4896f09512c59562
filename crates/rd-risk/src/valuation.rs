//! Currency resolution and USD valuation.
//!
//! [`ValuationEngine`] turns raw positions and an FX snapshot into a
//! [`ValuedPortfolio`]: every position that resolves to a currency with a known
//! rate gets local and USD values, GMV weights and a days-to-unwind estimate.
//! Positions that cannot be resolved are set aside rather than carried as
//! missing values.

use rd_types::{
    currency_for_country, CurrencySource, FxTable, PortfolioError, Position, RdError, RdResult,
    UnresolvedPosition, UnresolvedReason, UnwindHorizon, ValuedPortfolio, ValuedPosition,
};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// A position's currency together with its USD conversion rate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCurrency {
    pub code: String,
    pub source: CurrencySource,
    pub to_usd: Decimal,
}

/// Resolve a position's currency: the reported code if present, otherwise the
/// country's home currency; either way the FX table must carry a rate for it.
pub fn resolve_currency(position: &Position, fx: &FxTable) -> Result<ResolvedCurrency, UnresolvedReason> {
    let (code, source) = match position.currency.as_deref() {
        Some(code) => (code, CurrencySource::Reported),
        None => match currency_for_country(&position.country) {
            Some(code) => (code, CurrencySource::CountryFallback),
            None => {
                return Err(UnresolvedReason::UnknownCountry {
                    country: position.country.clone(),
                })
            }
        },
    };

    let to_usd = fx.rate(code).ok_or_else(|| UnresolvedReason::MissingFxRate {
        currency: code.to_string(),
    })?;

    Ok(ResolvedCurrency {
        code: code.to_string(),
        source,
        to_usd,
    })
}

/// Stateless valuation of a portfolio against an FX snapshot.
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    adv_participation_rate: Decimal,
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self {
            adv_participation_rate: Decimal::new(10, 2),
        }
    }
}

impl ValuationEngine {
    /// `adv_participation_rate` is the fraction of average daily volume that
    /// can be traded per day when unwinding.
    pub fn new(adv_participation_rate: Decimal) -> Self {
        Self {
            adv_participation_rate,
        }
    }

    pub fn value(&self, positions: &[Position], fx: &FxTable) -> RdResult<ValuedPortfolio> {
        if positions.is_empty() {
            return Err(PortfolioError::Empty.into());
        }

        let mut resolved = Vec::with_capacity(positions.len());
        let mut unresolved = Vec::new();

        for position in positions {
            match resolve_currency(position, fx) {
                Ok(currency) => {
                    if currency.source == CurrencySource::CountryFallback {
                        debug!(
                            ticker = %position.ticker,
                            country = %position.country,
                            currency = %currency.code,
                            "Filled missing currency from country"
                        );
                    }
                    resolved.push((position, currency));
                }
                Err(reason) => {
                    warn!(
                        ticker = %position.ticker,
                        reason = %reason,
                        "Excluding position with unresolved currency"
                    );
                    unresolved.push(UnresolvedPosition {
                        position: position.clone(),
                        reason,
                    });
                }
            }
        }

        let mut priced = Vec::with_capacity(resolved.len());
        let mut total_gmv = Decimal::ZERO;
        for (position, currency) in resolved {
            let amounts = LocalAndUsd::compute(position, currency.to_usd)?;
            total_gmv = total_gmv
                .checked_add(amounts.value_usd.abs())
                .ok_or_else(|| overflow(&position.ticker, "gross market value"))?;
            priced.push((position, currency, amounts));
        }

        if total_gmv <= Decimal::ZERO {
            return Err(PortfolioError::NonPositiveGmv {
                gmv: total_gmv,
                valued: priced.len(),
                total: positions.len(),
            }
            .into());
        }

        let valued = priced
            .into_iter()
            .map(|(position, currency, amounts)| self.value_position(position, currency, amounts, total_gmv))
            .collect::<RdResult<Vec<ValuedPosition>>>()?;
        check_aggregate_range(&valued, total_gmv)?;

        let portfolio = ValuedPortfolio {
            positions: valued,
            unresolved,
            total_gmv,
        };

        info!(
            valued = portfolio.len(),
            unresolved = portfolio.unresolved.len(),
            currency_fallbacks = portfolio.fallback_count(),
            total_gmv = %total_gmv,
            "Portfolio valued"
        );

        Ok(portfolio)
    }

    fn value_position(
        &self,
        position: &Position,
        currency: ResolvedCurrency,
        amounts: LocalAndUsd,
        total_gmv: Decimal,
    ) -> RdResult<ValuedPosition> {
        Ok(ValuedPosition {
            side: position.side(),
            currency: currency.code,
            currency_source: currency.source,
            to_usd: currency.to_usd,
            position_value_local: amounts.value_local,
            cost_value_local: amounts.cost_local,
            unrealized_pnl_local: amounts.pnl_local,
            position_value_usd: amounts.value_usd,
            cost_value_usd: amounts.cost_usd,
            unrealized_pnl_usd: amounts.pnl_usd,
            position_weight: amounts.value_usd / total_gmv,
            dollar_weight: amounts.value_usd.abs() / total_gmv,
            days_to_unwind: self.days_to_unwind(position)?,
            position: position.clone(),
        })
    }

    /// |shares| / (ADV x participation rate); unbounded when nothing trades.
    pub fn days_to_unwind(&self, position: &Position) -> RdResult<UnwindHorizon> {
        let daily_capacity = position.avg_daily_volume * self.adv_participation_rate;
        if daily_capacity <= Decimal::ZERO {
            warn!(ticker = %position.ticker, "Zero average daily volume, position cannot be unwound");
            return Ok(UnwindHorizon::Unbounded);
        }
        position
            .shares
            .abs()
            .checked_div(daily_capacity)
            .map(UnwindHorizon::Days)
            .ok_or_else(|| overflow(&position.ticker, "days to unwind"))
    }
}

/// Local and USD amounts of one position.
#[derive(Debug, Clone, Copy)]
struct LocalAndUsd {
    value_local: Decimal,
    cost_local: Decimal,
    pnl_local: Decimal,
    value_usd: Decimal,
    cost_usd: Decimal,
    pnl_usd: Decimal,
}

impl LocalAndUsd {
    fn compute(position: &Position, to_usd: Decimal) -> RdResult<Self> {
        let ticker = &position.ticker;
        let value_local = position
            .position_value_local()
            .ok_or_else(|| overflow(ticker, "position value"))?;
        let cost_local = position
            .cost_value_local()
            .ok_or_else(|| overflow(ticker, "cost value"))?;
        let pnl_local = position
            .unrealized_pnl_local()
            .ok_or_else(|| overflow(ticker, "unrealized P&L"))?;

        let usd = |amount: Decimal, what: &str| amount.checked_mul(to_usd).ok_or_else(|| overflow(ticker, what));
        Ok(Self {
            value_local,
            cost_local,
            pnl_local,
            value_usd: usd(value_local, "USD position value")?,
            cost_usd: usd(cost_local, "USD cost value")?,
            pnl_usd: usd(pnl_local, "USD unrealized P&L")?,
        })
    }
}

fn overflow(ticker: &str, what: &str) -> RdError {
    PortfolioError::CalculationError {
        message: format!("{} of {} is out of range", what, ticker),
    }
    .into()
}

/// Bounds every sum and GMV ratio the metrics take, so that plain `Decimal`
/// arithmetic downstream cannot overflow. Net and group totals are bounded by
/// GMV itself; P&L, beta dollars and unwind days are checked here.
fn check_aggregate_range(positions: &[ValuedPosition], total_gmv: Decimal) -> RdResult<()> {
    let mut gross_pnl = Decimal::ZERO;
    let mut gross_beta_dollars = Decimal::ZERO;
    let mut total_days = Decimal::ZERO;

    for p in positions {
        let beta_dollars = p
            .beta()
            .checked_mul(p.position_value_usd)
            .ok_or_else(|| overflow(p.ticker(), "beta-weighted value"))?;
        gross_beta_dollars = gross_beta_dollars
            .checked_add(beta_dollars.abs())
            .ok_or_else(|| overflow(p.ticker(), "portfolio beta exposure"))?;
        gross_pnl = gross_pnl
            .checked_add(p.unrealized_pnl_usd.abs())
            .ok_or_else(|| overflow(p.ticker(), "total unrealized P&L"))?;
        if let Some(days) = p.days_to_unwind.days() {
            total_days = total_days
                .checked_add(days)
                .ok_or_else(|| overflow(p.ticker(), "total days to unwind"))?;
        }
    }

    for (total, what) in [(gross_pnl, "P&L to GMV"), (gross_beta_dollars, "portfolio beta")] {
        total
            .checked_div(total_gmv)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(|| {
                RdError::from(PortfolioError::CalculationError {
                    message: format!("{} is out of range", what),
                })
            })?;
    }

    Ok(())
}
