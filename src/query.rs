//! Free-text query resolution: an ordered keyword classifier, best-effort
//! month/window extractors, and the exhaustive dispatcher from resolved
//! intent to metric call.
//!
//! Classification and extraction are independent passes; a query can
//! classify successfully with no extractable month. Extraction never
//! errors on malformed text, it just reports "not found" and lets the
//! caller apply defaults.

use crate::error::{FinQueryError, Result};
use crate::ledger::FinancialDataset;
use crate::metrics::{
    self, BurnMultiple, CashRunway, EbitdaPoint, EntityRevenue, GrossMarginPoint, OpexItem,
    OpexRatio, RevenueGrowthPoint, RevenueVsBudget,
};
use crate::period::Period;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: usize = 3;

/// The metric a question resolves to. One variant per metric, so the
/// dispatcher's match is checked at compile time when a metric is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RevenueVsBudget,
    GrossMarginTrend,
    OpexBreakdown,
    CashRunway,
    EbitdaTrend,
    OpexRatio,
    RevenueGrowth,
    BurnMultiple,
    EntityRevenue,
}

/// First-match-wins keyword classification over the lowercased text.
///
/// The first four predicates and their order are load-bearing: a text
/// containing both "revenue" and "budget" always resolves to the
/// variance metric no matter what else it mentions. The remaining rules
/// are appended after them so they can never change those outcomes.
/// `OpexRatio` has no rule of its own ("opex" is already claimed by the
/// breakdown rule) and is reached by constructing the intent directly.
pub fn classify(text: &str) -> Option<Intent> {
    let q = text.to_lowercase();

    if q.contains("revenue") && q.contains("budget") {
        Some(Intent::RevenueVsBudget)
    } else if q.contains("gross margin") || q.contains("gm") {
        Some(Intent::GrossMarginTrend)
    } else if q.contains("opex") {
        Some(Intent::OpexBreakdown)
    } else if q.contains("cash") && q.contains("runway") {
        Some(Intent::CashRunway)
    } else if q.contains("burn") && q.contains("multiple") {
        Some(Intent::BurnMultiple)
    } else if q.contains("ebitda") {
        Some(Intent::EbitdaTrend)
    } else if q.contains("growth") {
        Some(Intent::RevenueGrowth)
    } else if q.contains("entit") {
        Some(Intent::EntityRevenue)
    } else {
        None
    }
}

static NUMERIC_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-/](\d{1,2})").expect("numeric month pattern compiles"));

static NAMED_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+(\d{4})")
        .expect("named month pattern compiles")
});

static TRAILING_WINDOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)last\s+(\d+)\s+month").expect("window pattern compiles"));

const MONTH_ABBREVS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Pulls a month out of free text: numeric `YYYY-M[M]` (also with `/`)
/// first, then a month name followed by a 4-digit year. Returns `None`
/// when neither form is present or the month is out of range.
pub fn extract_month(text: &str) -> Option<Period> {
    if let Some(captures) = NUMERIC_MONTH.captures(text) {
        let year: i32 = captures[1].parse().ok()?;
        let month: u32 = captures[2].parse().ok()?;
        return Period::new(year, month).ok();
    }

    if let Some(captures) = NAMED_MONTH.captures(text) {
        let name = captures[1].to_lowercase();
        let month = MONTH_ABBREVS.iter().position(|m| *m == name)? as u32 + 1;
        let year: i32 = captures[2].parse().ok()?;
        return Period::new(year, month).ok();
    }

    None
}

/// Detects a "last N month(s)" trailing window, falling back to the
/// given default.
pub fn extract_window(text: &str, default: usize) -> usize {
    TRAILING_WINDOW
        .captures(text)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(default)
}

/// The resolver's output contract: which metric (if any), which month
/// (if any), and the trailing window with the default applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedQuery {
    pub intent: Option<Intent>,
    pub month: Option<Period>,
    pub window: usize,
}

pub fn resolve(text: &str) -> ResolvedQuery {
    let resolved = ResolvedQuery {
        intent: classify(text),
        month: extract_month(text),
        window: extract_window(text, DEFAULT_WINDOW),
    };
    debug!(
        "resolved query {:?}: intent={:?} month={:?} window={}",
        text, resolved.intent, resolved.month, resolved.window
    );
    resolved
}

/// A metric's output in serializable form, tagged by metric name, as
/// handed to the dashboard/report collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricReport {
    RevenueVsBudget(RevenueVsBudget),
    GrossMarginTrend { trend: Vec<GrossMarginPoint> },
    OpexBreakdown { breakdown: Vec<OpexItem> },
    CashRunway(CashRunway),
    EbitdaTrend { trend: Vec<EbitdaPoint> },
    OpexRatio(OpexRatio),
    RevenueGrowth { trend: Vec<RevenueGrowthPoint> },
    BurnMultiple(BurnMultiple),
    EntityRevenue { ranking: Vec<EntityRevenue> },
}

fn default_month(dataset: &FinancialDataset, resolved: &ResolvedQuery) -> Result<Period> {
    resolved
        .month
        .or_else(|| dataset.latest_period())
        .ok_or(FinQueryError::EmptyLedger)
}

/// Maps a resolved query onto the metrics library. Returns `Ok(None)`
/// for an unresolved intent; the caller owns the user-facing messaging.
/// Month-scoped metrics fall back to the latest period with activity
/// when the text named none.
pub fn dispatch(dataset: &FinancialDataset, resolved: &ResolvedQuery) -> Result<Option<MetricReport>> {
    let Some(intent) = resolved.intent else {
        return Ok(None);
    };

    let report = match intent {
        Intent::RevenueVsBudget => MetricReport::RevenueVsBudget(metrics::revenue_vs_budget(
            dataset,
            default_month(dataset, resolved)?,
        )?),
        Intent::GrossMarginTrend => MetricReport::GrossMarginTrend {
            trend: metrics::gross_margin_trend(dataset, resolved.window)?,
        },
        Intent::OpexBreakdown => MetricReport::OpexBreakdown {
            breakdown: metrics::opex_breakdown(dataset, default_month(dataset, resolved)?)?,
        },
        Intent::CashRunway => MetricReport::CashRunway(metrics::cash_runway(dataset)?),
        Intent::EbitdaTrend => MetricReport::EbitdaTrend {
            trend: metrics::ebitda_trend(dataset, resolved.window)?,
        },
        Intent::OpexRatio => {
            MetricReport::OpexRatio(metrics::opex_ratio(dataset, default_month(dataset, resolved)?)?)
        }
        Intent::RevenueGrowth => MetricReport::RevenueGrowth {
            trend: metrics::revenue_growth(dataset, resolved.window)?,
        },
        Intent::BurnMultiple => {
            MetricReport::BurnMultiple(metrics::burn_multiple(dataset, resolved.window)?)
        }
        Intent::EntityRevenue => MetricReport::EntityRevenue {
            ranking: metrics::entity_revenue(dataset, default_month(dataset, resolved)?)?,
        },
    };

    Ok(Some(report))
}

/// One-call entry for chat-style callers: resolve the text, then run
/// the metric it maps to.
pub fn run_query(dataset: &FinancialDataset, text: &str) -> Result<Option<MetricReport>> {
    dispatch(dataset, &resolve(text))
}
