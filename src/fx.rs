use crate::period::Period;
use crate::schema::RawFxRow;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const USD: &str = "USD";

/// One exchange rate, keyed on (period, currency). Read-only after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRate {
    pub period: Period,
    pub currency: String,
    pub rate_to_usd: f64,
}

impl From<RawFxRow> for FxRate {
    fn from(row: RawFxRow) -> Self {
        Self {
            period: row.period,
            currency: row.currency,
            rate_to_usd: row.rate_to_usd,
        }
    }
}

/// Returns the rate table guaranteed to contain a USD = 1.0 identity row
/// for every period appearing in it. The caller's rows are not mutated.
///
/// An empty input stays empty: there are no periods to synthesize for,
/// and downstream every ledger row will fail FX resolution.
pub fn ensure_usd_identity(rows: &[RawFxRow]) -> Vec<FxRate> {
    let mut rates: Vec<FxRate> = rows.iter().cloned().map(FxRate::from).collect();

    let has_usd_identity = rates
        .iter()
        .any(|r| r.currency == USD && r.rate_to_usd == 1.0);

    if !has_usd_identity {
        let periods: BTreeSet<Period> = rates.iter().map(|r| r.period).collect();
        debug!(
            "FX table has no USD identity row; synthesizing one for {} period(s)",
            periods.len()
        );
        for period in periods {
            rates.push(FxRate {
                period,
                currency: USD.to_string(),
                rate_to_usd: 1.0,
            });
        }
    }

    rates
}

/// Lookup table over the normalized rates, built once at load time.
#[derive(Debug, Clone, Default)]
pub struct FxTable {
    rates: BTreeMap<(Period, String), f64>,
}

impl FxTable {
    pub fn from_rates(rates: &[FxRate]) -> Self {
        let mut table = BTreeMap::new();
        for rate in rates {
            table.insert((rate.period, rate.currency.clone()), rate.rate_to_usd);
        }
        Self { rates: table }
    }

    pub fn rate(&self, period: Period, currency: &str) -> Option<f64> {
        self.rates.get(&(period, currency.to_string())).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
