use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use super::calendar::iso_date;
use crate::CurrencyCode;

/// Most recent published rates for one base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestRates {
    pub base: CurrencyCode,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub rates: BTreeMap<String, f64>,
}

impl LatestRates {
    pub fn new(base: CurrencyCode, date: Date, rates: BTreeMap<String, f64>) -> Self {
        Self { base, date, rates }
    }

    /// Rate for `quote`, or `None` when the provider did not publish one.
    pub fn rate_for(&self, quote: &CurrencyCode) -> Option<f64> {
        if quote == &self.base {
            return Some(1.0);
        }
        self.rates.get(quote.as_str()).copied()
    }
}
