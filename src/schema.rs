use crate::period::Period;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One raw line item as produced by the spreadsheet ingestion step,
/// before currency conversion. The same shape carries both the actuals
/// and the budget sheets.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawLedgerRow {
    #[schemars(description = "Month the amount belongs to, as YYYY-MM")]
    pub period: Period,

    #[schemars(description = "Legal entity the amount was booked under (e.g., 'ParentCo')")]
    pub entity: String,

    #[schemars(
        description = "Account category. Flat names like 'Revenue' or 'COGS', except the operating-expense family which is hierarchical: 'Opex:<subcategory>'"
    )]
    pub account_category: String,

    #[schemars(description = "ISO currency code the amount is denominated in (e.g., 'USD', 'EUR')")]
    pub currency: String,

    #[schemars(description = "Amount in the row's own currency")]
    pub amount: f64,
}

/// One raw cash balance snapshot, one row per (period, entity) pair.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawCashRow {
    pub period: Period,
    pub entity: String,
    #[schemars(description = "Closing cash balance for the month, already in USD")]
    pub cash_usd: f64,
}

/// One raw exchange-rate row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawFxRow {
    pub period: Period,
    pub currency: String,
    #[schemars(description = "Multiplier converting one unit of the currency into USD")]
    pub rate_to_usd: f64,
}

/// The four-table input contract produced by the ingestion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawWorkbook {
    pub actuals: Vec<RawLedgerRow>,
    pub budget: Vec<RawLedgerRow>,
    pub cash: Vec<RawCashRow>,
    pub fx: Vec<RawFxRow>,
}

impl RawWorkbook {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(RawWorkbook)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = RawWorkbook::schema_as_json().unwrap();
        assert!(schema_json.contains("actuals"));
        assert!(schema_json.contains("rate_to_usd"));
        assert!(schema_json.contains("account_category"));
    }

    #[test]
    fn test_round_trip_serialization() {
        let workbook = RawWorkbook {
            actuals: vec![RawLedgerRow {
                period: Period::new(2023, 1).unwrap(),
                entity: "ParentCo".to_string(),
                account_category: "Revenue".to_string(),
                currency: "USD".to_string(),
                amount: 1000.0,
            }],
            budget: vec![],
            cash: vec![RawCashRow {
                period: Period::new(2023, 1).unwrap(),
                entity: "Consolidated".to_string(),
                cash_usd: 10000.0,
            }],
            fx: vec![RawFxRow {
                period: Period::new(2023, 1).unwrap(),
                currency: "EUR".to_string(),
                rate_to_usd: 1.08,
            }],
        };

        let json = serde_json::to_string_pretty(&workbook).unwrap();
        assert!(json.contains("ParentCo"));

        let deserialized: RawWorkbook = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.actuals.len(), 1);
        assert_eq!(deserialized.fx[0].currency, "EUR");
    }
}
