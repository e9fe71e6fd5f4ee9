use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use crate::config::CurrencyConfig;
use crate::money::round_cents;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
    #[error("Invalid exchange rate for {0}")]
    InvalidRate(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub amount: Decimal,
    pub from: String,
    pub to: String,
    pub converted: Decimal,
    pub rate: Decimal,
}

/// Converts amounts between currencies. Rate sourcing lives behind this seam.
pub trait CurrencyConverter: Send + Sync {
    fn base_currency(&self) -> &str;

    fn rates(&self) -> BTreeMap<String, Decimal>;

    /// Units of `code` per one unit of the base currency
    fn units_per_base(&self, code: &str) -> Result<Decimal, ConversionError>;

    /// Cross rate for display; conversions never multiply by it
    fn rate(&self, from: &str, to: &str) -> Result<Decimal, ConversionError> {
        let from_rate = self.units_per_base(from)?;
        let to_rate = self.units_per_base(to)?;
        if from.eq_ignore_ascii_case(to) {
            return Ok(Decimal::ONE);
        }
        Ok(to_rate / from_rate)
    }

    /// `amount / rate[from] * rate[to]`, rounded to cents once at the end
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> Result<Conversion, ConversionError> {
        let from_rate = self.units_per_base(from)?;
        let to_rate = self.units_per_base(to)?;
        let converted = if from.eq_ignore_ascii_case(to) {
            round_cents(amount)
        } else {
            round_cents(amount / from_rate * to_rate)
        };
        Ok(Conversion {
            amount,
            from: from.to_ascii_uppercase(),
            to: to.to_ascii_uppercase(),
            converted,
            rate: self.rate(from, to)?,
        })
    }
}

/// Fixed table of rates quoted as units per one unit of the base currency
#[derive(Debug, Clone)]
pub struct StaticRateConverter {
    base: String,
    rates: BTreeMap<String, Decimal>,
}

impl StaticRateConverter {
    pub fn from_config(config: &CurrencyConfig) -> Result<Self, ConversionError> {
        let base = config.base_currency.to_ascii_uppercase();
        let mut rates = BTreeMap::new();

        for (code, raw) in &config.rates {
            let rate = Decimal::from_str(raw.trim())
                .ok()
                .filter(|r| *r > Decimal::ZERO)
                .ok_or_else(|| ConversionError::InvalidRate(code.clone()))?;
            rates.insert(code.to_ascii_uppercase(), rate);
        }
        rates.insert(base.clone(), Decimal::ONE);

        Ok(Self { base, rates })
    }
}

impl CurrencyConverter for StaticRateConverter {
    fn base_currency(&self) -> &str {
        &self.base
    }

    fn rates(&self) -> BTreeMap<String, Decimal> {
        self.rates.clone()
    }

    fn units_per_base(&self, code: &str) -> Result<Decimal, ConversionError> {
        self.rates
            .get(&code.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| ConversionError::UnsupportedCurrency(code.to_string()))
    }
}
