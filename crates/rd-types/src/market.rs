use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed ISO-3 country to ISO-4217 currency mapping used when a position
/// arrives without a currency code.
pub const COUNTRY_CURRENCIES: &[(&str, &str)] = &[
    ("AUS", "AUD"),
    ("USA", "USD"),
    ("GBR", "GBP"),
    ("JPN", "JPY"),
    ("CHE", "CHF"),
    ("CAN", "CAD"),
    ("FRA", "EUR"),
    ("GER", "EUR"),
    ("ITA", "EUR"),
    ("ESP", "EUR"),
    ("NLD", "EUR"),
    ("BEL", "EUR"),
    ("CHN", "CNY"),
    ("HKG", "HKD"),
    ("BRA", "BRL"),
];

/// Look up the home currency of a country.
pub fn currency_for_country(country: &str) -> Option<&'static str> {
    COUNTRY_CURRENCIES
        .iter()
        .find(|(code, _)| *code == country)
        .map(|(_, currency)| *currency)
}

/// Snapshot of FX rates, one `to_USD` multiplier per currency code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxTable {
    rates: HashMap<String, Decimal>,
}

impl FxTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rate, returning the previous rate for that currency if any.
    pub fn insert(&mut self, currency: &str, to_usd: Decimal) -> Option<Decimal> {
        self.rates.insert(currency.to_string(), to_usd)
    }

    pub fn rate(&self, currency: &str) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Decimal)> for FxTable {
    fn from_iter<I: IntoIterator<Item = (S, Decimal)>>(iter: I) -> Self {
        Self {
            rates: iter.into_iter().map(|(c, r)| (c.into(), r)).collect(),
        }
    }
}
