//! Pure metric computations over a loaded [`FinancialDataset`].
//!
//! Every function reads from the caller's immutable snapshot, performs
//! linear scans and groupings only, and returns a typed record (or an
//! ascending trailing-window sequence of per-period records). Values
//! that are mathematically undefined come back as `None`, never as 0,
//! infinity, or NaN. Monetary and percentage outputs are rounded to 2
//! decimals at the point of return; runway to 1 decimal.

use crate::error::{FinQueryError, Result};
use crate::ledger::{EntryType, FinancialDataset, LedgerEntry};
use crate::period::Period;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const REVENUE: &str = "Revenue";
pub const COGS: &str = "COGS";
pub const OPEX_PREFIX: &str = "Opex:";

/// Month argument accepted by the per-month metrics: either a raw
/// "YYYY-MM" string or an already-resolved [`Period`].
#[derive(Debug, Clone)]
pub enum MonthSelector {
    Text(String),
    Resolved(Period),
}

impl MonthSelector {
    pub fn resolve(&self) -> Result<Period> {
        match self {
            MonthSelector::Text(text) => Period::parse(text),
            MonthSelector::Resolved(period) => Ok(*period),
        }
    }
}

impl From<Period> for MonthSelector {
    fn from(period: Period) -> Self {
        MonthSelector::Resolved(period)
    }
}

impl From<&str> for MonthSelector {
    fn from(text: &str) -> Self {
        MonthSelector::Text(text.to_string())
    }
}

impl From<String> for MonthSelector {
    fn from(text: String) -> Self {
        MonthSelector::Text(text)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn is_actual(entry: &LedgerEntry) -> bool {
    entry.entry_type == EntryType::Actual
}

fn check_window(n_periods: usize) -> Result<()> {
    if n_periods == 0 {
        return Err(FinQueryError::InvalidWindow(n_periods));
    }
    Ok(())
}

fn tail<T>(mut points: Vec<T>, n: usize) -> Vec<T> {
    let excess = points.len().saturating_sub(n);
    if excess > 0 {
        points.drain(..excess);
    }
    points
}

/// Revenue vs budget for one month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueVsBudget {
    pub month: Period,
    pub actual: f64,
    pub budget: f64,
    pub variance: f64,
    /// `None` when the month has no budget to compare against.
    pub variance_pct: Option<f64>,
}

pub fn revenue_vs_budget(
    dataset: &FinancialDataset,
    month: impl Into<MonthSelector>,
) -> Result<RevenueVsBudget> {
    let month = month.into().resolve()?;

    let mut actual = 0.0;
    let mut budget = 0.0;
    for entry in dataset.ledger() {
        if entry.period != month || entry.account_category != REVENUE {
            continue;
        }
        if let Some(amount) = entry.amount_usd {
            match entry.entry_type {
                EntryType::Actual => actual += amount,
                EntryType::Budget => budget += amount,
            }
        }
    }

    let variance = actual - budget;
    let variance_pct = if budget != 0.0 {
        Some(round2(variance / budget * 100.0))
    } else {
        None
    };

    Ok(RevenueVsBudget {
        month,
        actual: round2(actual),
        budget: round2(budget),
        variance: round2(variance),
        variance_pct,
    })
}

/// One period of the gross-margin trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrossMarginPoint {
    pub period: Period,
    pub revenue: f64,
    pub cogs: f64,
    /// `None` when the period booked no revenue (including the 0/0 case).
    pub gm_pct: Option<f64>,
}

#[derive(Default)]
struct PeriodTotals {
    revenue: f64,
    cogs: f64,
    opex: f64,
}

/// Groups actual rows by period, splitting out revenue, COGS, and the
/// Opex family. A period appears once it has any actual activity;
/// absent categories within it default to 0.
fn actuals_by_period(dataset: &FinancialDataset) -> BTreeMap<Period, PeriodTotals> {
    let mut grouped: BTreeMap<Period, PeriodTotals> = BTreeMap::new();
    for entry in dataset.ledger().iter().filter(|e| is_actual(e)) {
        let totals = grouped.entry(entry.period).or_default();
        let Some(amount) = entry.amount_usd else {
            continue;
        };
        if entry.account_category == REVENUE {
            totals.revenue += amount;
        } else if entry.account_category == COGS {
            totals.cogs += amount;
        } else if entry.account_category.starts_with(OPEX_PREFIX) {
            totals.opex += amount;
        }
    }
    grouped
}

pub fn gross_margin_trend(
    dataset: &FinancialDataset,
    n_periods: usize,
) -> Result<Vec<GrossMarginPoint>> {
    check_window(n_periods)?;

    let points: Vec<GrossMarginPoint> = actuals_by_period(dataset)
        .into_iter()
        .map(|(period, totals)| {
            let gm_pct = if totals.revenue != 0.0 {
                Some(round2(
                    (totals.revenue - totals.cogs) / totals.revenue * 100.0,
                ))
            } else {
                None
            };
            GrossMarginPoint {
                period,
                revenue: round2(totals.revenue),
                cogs: round2(totals.cogs),
                gm_pct,
            }
        })
        .collect();

    Ok(tail(points, n_periods))
}

/// One Opex subcategory's total for a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpexItem {
    pub category: String,
    pub amount_usd: f64,
}

pub fn opex_breakdown(
    dataset: &FinancialDataset,
    month: impl Into<MonthSelector>,
) -> Result<Vec<OpexItem>> {
    let month = month.into().resolve()?;

    let mut grouped: BTreeMap<&str, f64> = BTreeMap::new();
    for entry in dataset.ledger() {
        if entry.period != month || !is_actual(entry) {
            continue;
        }
        let Some(subcategory) = entry.account_category.strip_prefix(OPEX_PREFIX) else {
            continue;
        };
        if let Some(amount) = entry.amount_usd {
            *grouped.entry(subcategory).or_insert(0.0) += amount;
        }
    }

    let mut breakdown: Vec<OpexItem> = grouped
        .into_iter()
        .map(|(category, amount)| OpexItem {
            category: category.to_string(),
            amount_usd: round2(amount),
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.amount_usd
            .partial_cmp(&a.amount_usd)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
    });

    Ok(breakdown)
}

/// Finite runway in months, or the explicit not-burning marker. A
/// tagged result keeps "unbounded" out of the numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "months")]
pub enum Runway {
    Months(f64),
    NotBurning,
}

impl Runway {
    pub fn months(&self) -> Option<f64> {
        match self {
            Runway::Months(months) => Some(*months),
            Runway::NotBurning => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashRunway {
    pub latest_month: Period,
    pub cash_now: f64,
    /// Average net cash decrease over the last 3 period deltas; reported
    /// as 0 when the company is flat or cash-positive.
    pub avg_burn: f64,
    pub runway_months: Runway,
}

pub fn cash_runway(dataset: &FinancialDataset) -> Result<CashRunway> {
    let cash = dataset.cash();
    let latest = cash.last().ok_or(FinQueryError::EmptyCashHistory)?;

    let deltas: Vec<f64> = cash.windows(2).map(|w| w[1].cash_usd - w[0].cash_usd).collect();
    let recent = &deltas[deltas.len().saturating_sub(3)..];

    let avg_burn = if recent.is_empty() {
        None
    } else {
        Some(-(recent.iter().sum::<f64>() / recent.len() as f64))
    };

    let (avg_burn, runway_months) = match avg_burn {
        Some(burn) if burn > 0.0 => (burn, Runway::Months(round1(latest.cash_usd / burn))),
        // Flat, growing, or too little history: not burning.
        _ => (0.0, Runway::NotBurning),
    };

    Ok(CashRunway {
        latest_month: latest.period,
        cash_now: round2(latest.cash_usd),
        avg_burn: round2(avg_burn),
        runway_months,
    })
}

/// One period of the EBITDA trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EbitdaPoint {
    pub period: Period,
    pub revenue: f64,
    pub cogs: f64,
    pub opex: f64,
    pub ebitda: f64,
}

pub fn ebitda_trend(dataset: &FinancialDataset, n_periods: usize) -> Result<Vec<EbitdaPoint>> {
    check_window(n_periods)?;

    let points: Vec<EbitdaPoint> = actuals_by_period(dataset)
        .into_iter()
        .map(|(period, totals)| EbitdaPoint {
            period,
            revenue: round2(totals.revenue),
            cogs: round2(totals.cogs),
            opex: round2(totals.opex),
            ebitda: round2(totals.revenue - totals.cogs - totals.opex),
        })
        .collect();

    Ok(tail(points, n_periods))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpexRatio {
    pub month: Period,
    pub opex: f64,
    pub revenue: f64,
    /// `None` when the month booked no revenue.
    pub opex_ratio_pct: Option<f64>,
}

pub fn opex_ratio(
    dataset: &FinancialDataset,
    month: impl Into<MonthSelector>,
) -> Result<OpexRatio> {
    let month = month.into().resolve()?;

    let mut opex = 0.0;
    let mut revenue = 0.0;
    for entry in dataset.ledger() {
        if entry.period != month || !is_actual(entry) {
            continue;
        }
        let Some(amount) = entry.amount_usd else {
            continue;
        };
        if entry.account_category.starts_with(OPEX_PREFIX) {
            opex += amount;
        } else if entry.account_category == REVENUE {
            revenue += amount;
        }
    }

    let opex_ratio_pct = if revenue != 0.0 {
        Some(round2(opex / revenue * 100.0))
    } else {
        None
    };

    Ok(OpexRatio {
        month,
        opex: round2(opex),
        revenue: round2(revenue),
        opex_ratio_pct,
    })
}

/// One period of the revenue-growth trend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueGrowthPoint {
    pub period: Period,
    pub revenue: f64,
    /// `None` for the first period of the series (nothing to grow from)
    /// and after a zero-revenue period.
    pub growth_pct: Option<f64>,
}

pub fn revenue_growth(
    dataset: &FinancialDataset,
    n_periods: usize,
) -> Result<Vec<RevenueGrowthPoint>> {
    check_window(n_periods)?;

    let mut by_period: BTreeMap<Period, f64> = BTreeMap::new();
    for entry in dataset.ledger().iter().filter(|e| is_actual(e)) {
        if entry.account_category != REVENUE {
            continue;
        }
        if let Some(amount) = entry.amount_usd {
            *by_period.entry(entry.period).or_insert(0.0) += amount;
        }
    }

    // Growth is computed over the full series before truncation, so a
    // window starting mid-series keeps its leading growth value.
    let mut points = Vec::with_capacity(by_period.len());
    let mut previous: Option<f64> = None;
    for (period, revenue) in by_period {
        let growth_pct = match previous {
            Some(prev) if prev != 0.0 => Some(round2((revenue - prev) / prev * 100.0)),
            _ => None,
        };
        points.push(RevenueGrowthPoint {
            period,
            revenue: round2(revenue),
            growth_pct,
        });
        previous = Some(revenue);
    }

    Ok(tail(points, n_periods))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BurnMultiple {
    pub n_months: usize,
    /// Latest period-over-period revenue gain; `None` with fewer than
    /// two revenue periods.
    pub net_new_revenue: Option<f64>,
    /// Mean cash burn over the trailing window; `None` with fewer than
    /// two cash periods.
    pub avg_burn: Option<f64>,
    /// `None` whenever either input is undefined or no net new revenue
    /// was generated.
    pub burn_multiple: Option<f64>,
}

pub fn burn_multiple(dataset: &FinancialDataset, n_months: usize) -> Result<BurnMultiple> {
    check_window(n_months)?;

    let growth = revenue_growth(dataset, n_months + 1)?;
    let net_new_revenue = match growth.as_slice() {
        [.., second_last, last] => Some(round2(last.revenue - second_last.revenue)),
        _ => None,
    };

    let cash = dataset.cash();
    let deltas: Vec<f64> = cash.windows(2).map(|w| w[1].cash_usd - w[0].cash_usd).collect();
    let recent = &deltas[deltas.len().saturating_sub(n_months)..];
    let avg_burn = if recent.is_empty() {
        None
    } else {
        Some(round2(-(recent.iter().sum::<f64>() / recent.len() as f64)))
    };

    let burn_multiple = match (avg_burn, net_new_revenue) {
        (Some(burn), Some(net_new)) if net_new > 0.0 => Some(round2(burn / net_new)),
        _ => None,
    };

    Ok(BurnMultiple {
        n_months,
        net_new_revenue,
        avg_burn,
        burn_multiple,
    })
}

/// One entity's actual revenue for a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRevenue {
    pub entity: String,
    pub amount_usd: f64,
}

pub fn entity_revenue(
    dataset: &FinancialDataset,
    month: impl Into<MonthSelector>,
) -> Result<Vec<EntityRevenue>> {
    let month = month.into().resolve()?;

    let mut grouped: BTreeMap<&str, f64> = BTreeMap::new();
    for entry in dataset.ledger() {
        if entry.period != month || !is_actual(entry) || entry.account_category != REVENUE {
            continue;
        }
        if let Some(amount) = entry.amount_usd {
            *grouped.entry(entry.entity.as_str()).or_insert(0.0) += amount;
        }
    }

    let mut ranking: Vec<EntityRevenue> = grouped
        .into_iter()
        .map(|(entity, amount)| EntityRevenue {
            entity: entity.to_string(),
            amount_usd: round2(amount),
        })
        .collect();
    ranking.sort_by(|a, b| {
        b.amount_usd
            .partial_cmp(&a.amount_usd)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity.cmp(&b.entity))
    });

    Ok(ranking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawCashRow, RawFxRow, RawLedgerRow};

    fn row(period: &str, entity: &str, category: &str, amount: f64) -> RawLedgerRow {
        RawLedgerRow {
            period: Period::parse(period).unwrap(),
            entity: entity.to_string(),
            account_category: category.to_string(),
            currency: "USD".to_string(),
            amount,
        }
    }

    fn cash_row(period: &str, cash_usd: f64) -> RawCashRow {
        RawCashRow {
            period: Period::parse(period).unwrap(),
            entity: "Consolidated".to_string(),
            cash_usd,
        }
    }

    fn usd_rates(periods: &[&str]) -> Vec<RawFxRow> {
        periods
            .iter()
            .map(|p| RawFxRow {
                period: Period::parse(p).unwrap(),
                currency: "USD".to_string(),
                rate_to_usd: 1.0,
            })
            .collect()
    }

    fn fixture() -> FinancialDataset {
        let actuals = vec![
            row("2023-01", "ParentCo", "Revenue", 1000.0),
            row("2023-01", "ParentCo", "COGS", 400.0),
            row("2023-01", "ParentCo", "Opex:Sales", 200.0),
            row("2023-02", "ParentCo", "Revenue", 1500.0),
            row("2023-02", "ParentCo", "COGS", 500.0),
            row("2023-02", "ParentCo", "Opex:Sales", 300.0),
            row("2023-03", "ParentCo", "Revenue", 800.0),
            row("2023-03", "ParentCo", "COGS", 400.0),
            row("2023-03", "ParentCo", "Opex:Sales", 600.0),
        ];
        let budget = vec![
            row("2023-01", "ParentCo", "Revenue", 1200.0),
            row("2023-02", "ParentCo", "Revenue", 1400.0),
        ];
        let cash = vec![
            cash_row("2023-01", 10000.0),
            cash_row("2023-02", 9000.0),
            cash_row("2023-03", 8000.0),
        ];
        let fx = usd_rates(&["2023-01", "2023-02", "2023-03"]);

        FinancialDataset::load(&actuals, &budget, &cash, &fx)
    }

    #[test]
    fn test_revenue_vs_budget_unfavorable() {
        let result = revenue_vs_budget(&fixture(), "2023-01").unwrap();
        assert_eq!(result.actual, 1000.0);
        assert_eq!(result.budget, 1200.0);
        assert_eq!(result.variance, -200.0);
        assert_eq!(result.variance_pct, Some(-16.67));
    }

    #[test]
    fn test_revenue_vs_budget_favorable() {
        let result = revenue_vs_budget(&fixture(), "2023-02").unwrap();
        assert_eq!(result.actual, 1500.0);
        assert_eq!(result.budget, 1400.0);
        assert_eq!(result.variance, 100.0);
        assert!(result.variance_pct.unwrap() > 0.0);
    }

    #[test]
    fn test_revenue_vs_budget_accepts_resolved_period() {
        let month = Period::new(2023, 1).unwrap();
        let result = revenue_vs_budget(&fixture(), month).unwrap();
        assert_eq!(result.actual, 1000.0);
    }

    #[test]
    fn test_revenue_vs_budget_zero_budget_has_absent_pct() {
        // 2023-03 carries no budget rows at all.
        let result = revenue_vs_budget(&fixture(), "2023-03").unwrap();
        assert_eq!(result.budget, 0.0);
        assert_eq!(result.variance_pct, None);
    }

    #[test]
    fn test_revenue_vs_budget_rejects_malformed_month() {
        assert!(revenue_vs_budget(&fixture(), "March 2023").is_err());
    }

    #[test]
    fn test_gross_margin_last_period() {
        let trend = gross_margin_trend(&fixture(), 3).unwrap();
        let last = trend.last().unwrap();
        // GM% = (800 - 400) / 800 = 50%
        assert_eq!(last.gm_pct, Some(50.0));
        assert_eq!(last.period.to_string(), "2023-03");
    }

    #[test]
    fn test_gross_margin_window_truncates_ascending() {
        let trend = gross_margin_trend(&fixture(), 2).unwrap();
        let periods: Vec<String> = trend.iter().map(|p| p.period.to_string()).collect();
        assert_eq!(periods, vec!["2023-02", "2023-03"]);
    }

    #[test]
    fn test_gross_margin_zero_revenue_is_absent() {
        let actuals = vec![
            row("2023-01", "ParentCo", "Revenue", 1000.0),
            row("2023-01", "ParentCo", "COGS", 400.0),
            row("2023-02", "ParentCo", "Revenue", 0.0),
            row("2023-02", "ParentCo", "COGS", 100.0),
        ];
        let dataset =
            FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01", "2023-02"]));

        let trend = gross_margin_trend(&dataset, 4).unwrap();
        assert_eq!(trend[0].gm_pct, Some(60.0));
        assert_eq!(trend[1].gm_pct, None);
    }

    #[test]
    fn test_gross_margin_zero_over_zero_is_absent() {
        // A period with zero revenue and zero cost: still undefined,
        // same policy as the plain zero-revenue case.
        let actuals = vec![
            row("2023-01", "ParentCo", "Revenue", 0.0),
            row("2023-01", "ParentCo", "COGS", 0.0),
        ];
        let dataset = FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01"]));

        let trend = gross_margin_trend(&dataset, 1).unwrap();
        assert_eq!(trend[0].gm_pct, None);
    }

    #[test]
    fn test_gross_margin_rejects_zero_window() {
        assert!(gross_margin_trend(&fixture(), 0).is_err());
    }

    #[test]
    fn test_opex_breakdown_splits_display_category() {
        let breakdown = opex_breakdown(&fixture(), "2023-01").unwrap();
        assert_eq!(
            breakdown,
            vec![OpexItem {
                category: "Sales".to_string(),
                amount_usd: 200.0,
            }]
        );
    }

    #[test]
    fn test_opex_breakdown_sorted_descending() {
        let actuals = vec![
            row("2023-01", "ParentCo", "Opex:Marketing", 50.0),
            row("2023-01", "ParentCo", "Opex:Sales", 200.0),
            row("2023-01", "ParentCo", "Opex:R&D", 120.0),
            row("2023-01", "ParentCo", "Revenue", 1000.0),
        ];
        let dataset = FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01"]));

        let breakdown = opex_breakdown(&dataset, "2023-01").unwrap();
        let categories: Vec<&str> = breakdown.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(categories, vec!["Sales", "R&D", "Marketing"]);
    }

    #[test]
    fn test_opex_breakdown_empty_month() {
        let breakdown = opex_breakdown(&fixture(), "2024-01").unwrap();
        assert!(breakdown.is_empty());
    }

    #[test]
    fn test_cash_runway_basic() {
        let result = cash_runway(&fixture()).unwrap();
        assert_eq!(result.latest_month.to_string(), "2023-03");
        assert_eq!(result.cash_now, 8000.0);
        assert_eq!(result.avg_burn, 1000.0);
        assert_eq!(result.runway_months, Runway::Months(8.0));
    }

    #[test]
    fn test_cash_runway_growing_cash_not_burning() {
        let cash = vec![
            cash_row("2023-01", 10000.0),
            cash_row("2023-02", 11000.0),
            cash_row("2023-03", 12000.0),
        ];
        let dataset = FinancialDataset::load(&[], &[], &cash, &[]);

        let result = cash_runway(&dataset).unwrap();
        assert_eq!(result.runway_months, Runway::NotBurning);
        assert_eq!(result.avg_burn, 0.0);
    }

    #[test]
    fn test_cash_runway_flat_cash_not_burning() {
        let cash = vec![
            cash_row("2023-01", 10000.0),
            cash_row("2023-02", 10000.0),
            cash_row("2023-03", 10000.0),
        ];
        let dataset = FinancialDataset::load(&[], &[], &cash, &[]);

        let result = cash_runway(&dataset).unwrap();
        assert_eq!(result.avg_burn, 0.0);
        assert_eq!(result.runway_months, Runway::NotBurning);
    }

    #[test]
    fn test_cash_runway_single_period_not_burning() {
        let dataset = FinancialDataset::load(&[], &[], &[cash_row("2023-01", 10000.0)], &[]);

        let result = cash_runway(&dataset).unwrap();
        assert_eq!(result.runway_months, Runway::NotBurning);
        assert_eq!(result.cash_now, 10000.0);
    }

    #[test]
    fn test_cash_runway_empty_history_errors() {
        let dataset = FinancialDataset::load(&[], &[], &[], &[]);
        assert!(matches!(
            cash_runway(&dataset),
            Err(FinQueryError::EmptyCashHistory)
        ));
    }

    #[test]
    fn test_cash_runway_rounds_to_one_decimal() {
        let cash = vec![
            cash_row("2023-01", 10000.0),
            cash_row("2023-02", 9100.0),
            cash_row("2023-03", 8200.0),
        ];
        let dataset = FinancialDataset::load(&[], &[], &cash, &[]);

        let result = cash_runway(&dataset).unwrap();
        // 8200 / 900 = 9.111... -> 9.1
        assert_eq!(result.runway_months, Runway::Months(9.1));
    }

    #[test]
    fn test_ebitda_trend_subtracts_opex_family() {
        let trend = ebitda_trend(&fixture(), 3).unwrap();
        // 2023-01: 1000 - 400 - 200
        assert_eq!(trend[0].ebitda, 400.0);
        // 2023-03: 800 - 400 - 600
        assert_eq!(trend[2].ebitda, -200.0);
    }

    #[test]
    fn test_ebitda_trend_absent_categories_default_to_zero() {
        let actuals = vec![row("2023-01", "ParentCo", "Revenue", 1000.0)];
        let dataset = FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01"]));

        let trend = ebitda_trend(&dataset, 1).unwrap();
        assert_eq!(trend[0].cogs, 0.0);
        assert_eq!(trend[0].opex, 0.0);
        assert_eq!(trend[0].ebitda, 1000.0);
    }

    #[test]
    fn test_opex_ratio_basic() {
        let result = opex_ratio(&fixture(), "2023-01").unwrap();
        assert_eq!(result.opex, 200.0);
        assert_eq!(result.revenue, 1000.0);
        assert_eq!(result.opex_ratio_pct, Some(20.0));
    }

    #[test]
    fn test_opex_ratio_no_revenue_is_absent() {
        let actuals = vec![row("2023-01", "ParentCo", "Opex:Sales", 200.0)];
        let dataset = FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01"]));

        let result = opex_ratio(&dataset, "2023-01").unwrap();
        assert_eq!(result.revenue, 0.0);
        assert_eq!(result.opex_ratio_pct, None);
    }

    #[test]
    fn test_revenue_growth_basic() {
        let growth = revenue_growth(&fixture(), 3).unwrap();
        assert_eq!(growth[0].growth_pct, None);
        // Jan (1000) -> Feb (1500) = +50%
        assert_eq!(growth[1].growth_pct, Some(50.0));
        // Feb (1500) -> Mar (800) = -46.67%
        assert_eq!(growth[2].growth_pct, Some(-46.67));
    }

    #[test]
    fn test_revenue_growth_window_keeps_leading_growth() {
        let growth = revenue_growth(&fixture(), 2).unwrap();
        assert_eq!(growth.len(), 2);
        // Window starts at Feb, whose growth vs Jan is still defined.
        assert_eq!(growth[0].period.to_string(), "2023-02");
        assert_eq!(growth[0].growth_pct, Some(50.0));
    }

    #[test]
    fn test_revenue_growth_after_zero_revenue_is_absent() {
        let actuals = vec![
            row("2023-01", "ParentCo", "Revenue", 0.0),
            row("2023-02", "ParentCo", "Revenue", 1000.0),
        ];
        let dataset =
            FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01", "2023-02"]));

        let growth = revenue_growth(&dataset, 2).unwrap();
        assert_eq!(growth[1].growth_pct, None);
    }

    #[test]
    fn test_burn_multiple_basic() {
        let result = burn_multiple(&fixture(), 2).unwrap();
        // Net new revenue Feb -> Mar is negative: undefined multiple.
        assert_eq!(result.net_new_revenue, Some(-700.0));
        assert_eq!(result.avg_burn, Some(1000.0));
        assert_eq!(result.burn_multiple, None);
    }

    #[test]
    fn test_burn_multiple_with_positive_net_new_revenue() {
        let actuals = vec![
            row("2023-01", "ParentCo", "Revenue", 1000.0),
            row("2023-02", "ParentCo", "Revenue", 1500.0),
        ];
        let cash = vec![
            cash_row("2023-01", 10000.0),
            cash_row("2023-02", 9000.0),
        ];
        let dataset =
            FinancialDataset::load(&actuals, &[], &cash, &usd_rates(&["2023-01", "2023-02"]));

        let result = burn_multiple(&dataset, 1).unwrap();
        assert_eq!(result.net_new_revenue, Some(500.0));
        assert_eq!(result.avg_burn, Some(1000.0));
        assert_eq!(result.burn_multiple, Some(2.0));
    }

    #[test]
    fn test_burn_multiple_single_revenue_period_is_absent() {
        let actuals = vec![row("2023-01", "ParentCo", "Revenue", 1000.0)];
        let dataset = FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01"]));

        let result = burn_multiple(&dataset, 2).unwrap();
        assert_eq!(result.net_new_revenue, None);
        assert_eq!(result.burn_multiple, None);
    }

    #[test]
    fn test_entity_revenue_ranked_descending() {
        let actuals = vec![
            row("2023-01", "EMEA", "Revenue", 400.0),
            row("2023-01", "Americas", "Revenue", 900.0),
            row("2023-01", "APAC", "Revenue", 250.0),
            row("2023-01", "Americas", "COGS", 300.0),
        ];
        let dataset = FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01"]));

        let ranking = entity_revenue(&dataset, "2023-01").unwrap();
        let entities: Vec<&str> = ranking.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["Americas", "EMEA", "APAC"]);
        assert_eq!(ranking[0].amount_usd, 900.0);
    }

    #[test]
    fn test_entity_revenue_empty_month() {
        let ranking = entity_revenue(&fixture(), "2024-06").unwrap();
        assert!(ranking.is_empty());
    }

    #[test]
    fn test_fx_gap_rows_are_skipped_not_zeroed() {
        let actuals = vec![
            row("2023-01", "ParentCo", "Revenue", 1000.0),
            RawLedgerRow {
                period: Period::parse("2023-01").unwrap(),
                entity: "EuroCo".to_string(),
                account_category: "Revenue".to_string(),
                currency: "EUR".to_string(),
                amount: 500.0,
            },
        ];
        // No EUR rate: the EuroCo row must drop out of the aggregate
        // rather than pulling it toward zero or erroring.
        let dataset = FinancialDataset::load(&actuals, &[], &[], &usd_rates(&["2023-01"]));

        let result = revenue_vs_budget(&dataset, "2023-01").unwrap();
        assert_eq!(result.actual, 1000.0);
        assert_eq!(dataset.fx_gaps().len(), 1);
    }

    #[test]
    fn test_variance_pct_rounded_to_two_decimals() {
        let actuals = vec![row("2023-01", "ParentCo", "Revenue", 1000.0)];
        let budget = vec![row("2023-01", "ParentCo", "Revenue", 3000.0)];
        let dataset = FinancialDataset::load(&actuals, &budget, &[], &usd_rates(&["2023-01"]));

        let result = revenue_vs_budget(&dataset, "2023-01").unwrap();
        // -2000 / 3000 * 100 = -66.666... -> -66.67
        assert_eq!(result.variance_pct, Some(-66.67));
    }
}
