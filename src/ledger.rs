use crate::fx::{ensure_usd_identity, FxTable};
use crate::period::Period;
use crate::schema::{RawCashRow, RawFxRow, RawLedgerRow, RawWorkbook};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Whether a ledger row is a realized or a planned amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Actual,
    Budget,
}

/// One unified ledger row, post currency conversion.
///
/// `amount_usd` is `None` when the row's (period, currency) had no
/// matching FX rate. Such rows are kept so the gap stays visible, but
/// every aggregate skips them; they are never coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub period: Period,
    pub entity: String,
    pub account_category: String,
    pub entry_type: EntryType,
    pub amount_usd: Option<f64>,
}

/// One cash balance row, one per (period, entity) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashBalance {
    pub period: Period,
    pub entity: String,
    pub cash_usd: f64,
}

/// A ledger row that failed FX resolution, surfaced as a data-quality
/// condition for the caller to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxGap {
    pub period: Period,
    pub entity: String,
    pub account_category: String,
    pub currency: String,
    pub entry_type: EntryType,
}

fn convert_side(rows: &[RawLedgerRow], fx: &FxTable, entry_type: EntryType) -> Vec<LedgerEntry> {
    rows.iter()
        .map(|row| {
            let rate = fx.rate(row.period, &row.currency);
            LedgerEntry {
                period: row.period,
                entity: row.entity.clone(),
                account_category: row.account_category.clone(),
                entry_type,
                amount_usd: rate.map(|r| row.amount * r),
            }
        })
        .collect()
}

/// The caller-owned immutable snapshot every metric call reads from.
///
/// Built once from the four raw tables; holds no mutable state, so
/// concurrent metric calls against one dataset need no locking. Caching
/// and reuse across queries belong to the application layer.
#[derive(Debug, Clone)]
pub struct FinancialDataset {
    ledger: Vec<LedgerEntry>,
    cash: Vec<CashBalance>,
    gaps: Vec<FxGap>,
}

impl FinancialDataset {
    /// Normalizes the FX table, converts both ledger sides to USD, and
    /// cleans the cash stream.
    pub fn load(
        actuals: &[RawLedgerRow],
        budget: &[RawLedgerRow],
        cash: &[RawCashRow],
        fx: &[RawFxRow],
    ) -> Self {
        let rates = ensure_usd_identity(fx);
        let fx_table = FxTable::from_rates(&rates);

        let mut ledger = convert_side(actuals, &fx_table, EntryType::Actual);
        ledger.extend(convert_side(budget, &fx_table, EntryType::Budget));

        let gaps: Vec<FxGap> = ledger
            .iter()
            .zip(actuals.iter().chain(budget.iter()))
            .filter(|(entry, _)| entry.amount_usd.is_none())
            .map(|(entry, raw)| FxGap {
                period: entry.period,
                entity: entry.entity.clone(),
                account_category: entry.account_category.clone(),
                currency: raw.currency.clone(),
                entry_type: entry.entry_type,
            })
            .collect();

        if !gaps.is_empty() {
            warn!(
                "{} ledger row(s) have no matching FX rate and are excluded from aggregates",
                gaps.len()
            );
        }

        let mut cash: Vec<CashBalance> = cash
            .iter()
            .map(|row| CashBalance {
                period: row.period,
                entity: row.entity.clone(),
                cash_usd: row.cash_usd,
            })
            .collect();
        cash.sort_by_key(|c| c.period);

        info!(
            "Loaded dataset: {} ledger rows ({} actuals, {} budget), {} cash rows, {} fx rates",
            ledger.len(),
            actuals.len(),
            budget.len(),
            cash.len(),
            fx_table.len()
        );
        debug!("FX resolution gaps: {}", gaps.len());

        Self { ledger, cash, gaps }
    }

    pub fn from_workbook(workbook: &RawWorkbook) -> Self {
        Self::load(
            &workbook.actuals,
            &workbook.budget,
            &workbook.cash,
            &workbook.fx,
        )
    }

    /// The unified ledger: actuals and budget rows, order-irrelevant.
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    /// Cash balances, sorted ascending by period.
    pub fn cash(&self) -> &[CashBalance] {
        &self.cash
    }

    /// Rows that failed FX resolution at load time.
    pub fn fx_gaps(&self) -> &[FxGap] {
        &self.gaps
    }

    /// Latest period with any ledger activity, the default month for
    /// queries that name none.
    pub fn latest_period(&self) -> Option<Period> {
        self.ledger.iter().map(|e| e.period).max()
    }
}
