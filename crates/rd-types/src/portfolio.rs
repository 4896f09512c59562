use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a holding, derived from the sign of the share count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Positive share counts are long; zero and negative counts are short.
    pub fn from_shares(shares: Decimal) -> Self {
        if shares > Decimal::ZERO {
            Side::Long
        } else {
            Side::Short
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        };
        f.pad(s)
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Ok(Side::Long),
            "SHORT" => Ok(Side::Short),
            other => Err(format!("unknown side '{}'", other)),
        }
    }
}

/// A single holding as read from the positions file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: String,
    pub name: String,
    /// ISO-3 country code
    pub country: String,
    pub sector: String,
    /// ISO-4217 currency code; `None` when the input left it blank
    pub currency: Option<String>,
    /// Signed share count: positive long, negative short
    pub shares: Decimal,
    pub market_price_local: Decimal,
    pub cost_basis_local: Decimal,
    pub beta: Decimal,
    /// Average daily traded volume in shares
    pub avg_daily_volume: Decimal,
}

impl Position {
    pub fn side(&self) -> Side {
        Side::from_shares(self.shares)
    }

    /// Shares times market price; `None` on overflow.
    pub fn position_value_local(&self) -> Option<Decimal> {
        self.shares.checked_mul(self.market_price_local)
    }

    /// Shares times cost basis; `None` on overflow.
    pub fn cost_value_local(&self) -> Option<Decimal> {
        self.shares.checked_mul(self.cost_basis_local)
    }

    pub fn unrealized_pnl_local(&self) -> Option<Decimal> {
        self.position_value_local()?
            .checked_sub(self.cost_value_local()?)
    }
}

/// Estimated time to liquidate a position.
///
/// `Unbounded` stands in for positions with zero average daily volume and
/// orders above every finite horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnwindHorizon {
    Days(Decimal),
    Unbounded,
}

impl UnwindHorizon {
    pub fn days(&self) -> Option<Decimal> {
        match self {
            UnwindHorizon::Days(d) => Some(*d),
            UnwindHorizon::Unbounded => None,
        }
    }

    /// Strictly longer than `days`.
    pub fn exceeds(&self, days: Decimal) -> bool {
        match self {
            UnwindHorizon::Days(d) => *d > days,
            UnwindHorizon::Unbounded => true,
        }
    }
}

/// Where a valued position's currency code came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurrencySource {
    /// Taken as-is from the positions file
    Reported,
    /// Filled in from the country lookup table
    CountryFallback,
}

/// A position with every valuation column populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuedPosition {
    pub position: Position,
    pub side: Side,
    pub currency: String,
    pub currency_source: CurrencySource,
    pub to_usd: Decimal,

    pub position_value_local: Decimal,
    pub cost_value_local: Decimal,
    pub unrealized_pnl_local: Decimal,

    pub position_value_usd: Decimal,
    pub cost_value_usd: Decimal,
    pub unrealized_pnl_usd: Decimal,

    /// Signed share of GMV (negative for shorts)
    pub position_weight: Decimal,
    /// Unsigned share of GMV
    pub dollar_weight: Decimal,
    pub days_to_unwind: UnwindHorizon,
}

impl ValuedPosition {
    pub fn ticker(&self) -> &str {
        &self.position.ticker
    }

    pub fn beta(&self) -> Decimal {
        self.position.beta
    }
}

/// Why a position could not be converted to USD
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnresolvedReason {
    /// No currency code and the country is not in the lookup table
    UnknownCountry { country: String },
    /// A currency code was found but the FX table has no rate for it
    MissingFxRate { currency: String },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::UnknownCountry { country } => {
                write!(f, "no currency and no mapping for country {}", country)
            }
            UnresolvedReason::MissingFxRate { currency } => {
                write!(f, "no FX rate for {}", currency)
            }
        }
    }
}

/// A position excluded from valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedPosition {
    pub position: Position,
    pub reason: UnresolvedReason,
}

/// Output of the valuation stage: valued positions in input order, the
/// positions that could not be valued, and the gross market value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuedPortfolio {
    pub positions: Vec<ValuedPosition>,
    pub unresolved: Vec<UnresolvedPosition>,
    pub total_gmv: Decimal,
}

impl ValuedPortfolio {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn longs(&self) -> impl Iterator<Item = &ValuedPosition> {
        self.positions.iter().filter(|p| p.side == Side::Long)
    }

    pub fn shorts(&self) -> impl Iterator<Item = &ValuedPosition> {
        self.positions.iter().filter(|p| p.side == Side::Short)
    }

    /// Number of positions whose currency came from the country lookup.
    pub fn fallback_count(&self) -> usize {
        self.positions
            .iter()
            .filter(|p| p.currency_source == CurrencySource::CountryFallback)
            .count()
    }
}
