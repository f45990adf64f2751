//! # finquery
//!
//! Deterministic financial metrics and free-text query resolution over a
//! unified monthly ledger of actuals, budget, and cash data.
//!
//! ## Core Concepts
//!
//! - **Period**: a month-granularity calendar bucket, the universal
//!   join/group key; all date-like inputs are truncated to it
//! - **Unified Ledger**: actual and budgeted line items converted to USD
//!   and merged into one typed stream
//! - **Metrics**: pure functions over the ledger and cash stream
//!   (revenue vs budget, margin and EBITDA trends, burn, runway)
//! - **Query Resolution**: keyword classification plus month/window
//!   extraction mapping a free-text question onto one metric call
//!
//! Spreadsheet ingestion, charting, and report export live outside this
//! crate; it consumes raw rows and hands back serializable records.
//!
//! ## Example
//!
//! ```rust,ignore
//! use finquery::*;
//!
//! let dataset = FinancialDataset::load(&actuals, &budget, &cash, &fx);
//!
//! // Direct metric call, dashboard-style:
//! let trend = gross_margin_trend(&dataset, 6)?;
//!
//! // Or resolve a question, chat-style:
//! match run_query(&dataset, "What was June 2025 revenue vs budget?")? {
//!     Some(report) => println!("{}", serde_json::to_string(&report)?),
//!     None => println!("Try revenue, margin, opex, or cash runway."),
//! }
//! ```

pub mod error;
pub mod fx;
pub mod ledger;
pub mod metrics;
pub mod period;
pub mod query;
pub mod schema;

pub use error::{FinQueryError, Result};
pub use fx::{ensure_usd_identity, FxRate, FxTable};
pub use ledger::{CashBalance, EntryType, FinancialDataset, FxGap, LedgerEntry};
pub use metrics::{
    burn_multiple, cash_runway, ebitda_trend, entity_revenue, gross_margin_trend, opex_breakdown,
    opex_ratio, revenue_growth, revenue_vs_budget, BurnMultiple, CashRunway, EbitdaPoint,
    EntityRevenue, GrossMarginPoint, MonthSelector, OpexItem, OpexRatio, RevenueGrowthPoint,
    RevenueVsBudget, Runway,
};
pub use period::Period;
pub use query::{
    classify, dispatch, extract_month, extract_window, resolve, run_query, Intent, MetricReport,
    ResolvedQuery, DEFAULT_WINDOW,
};
pub use schema::{RawCashRow, RawFxRow, RawLedgerRow, RawWorkbook};
