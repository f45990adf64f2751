use crate::error::{FinQueryError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A month-granularity calendar bucket, the universal join/group key.
///
/// Every date-like input is truncated to its enclosing month before use;
/// no computation in this crate compares dates at day granularity.
/// Serializes as a "YYYY-MM" string, matching the ingestion contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(FinQueryError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Parses "YYYY-MM", "YYYY-M", or "YYYY/MM". A day suffix
    /// ("YYYY-MM-DD") is accepted and truncated to the month.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let mut parts = trimmed.splitn(3, ['-', '/']);

        let year = parts
            .next()
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(|| FinQueryError::InvalidPeriod(text.to_string()))?;
        let month = parts
            .next()
            .and_then(|m| m.parse::<u32>().ok())
            .ok_or_else(|| FinQueryError::InvalidPeriod(text.to_string()))?;

        Self::new(year, month).map_err(|_| FinQueryError::InvalidPeriod(text.to_string()))
    }

    /// Truncates a calendar date to its enclosing month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .expect("validated month always yields a first day")
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Signed month distance from `start` to `self`.
    pub fn months_since(&self, start: Period) -> i32 {
        (self.year - start.year) * 12 + self.month as i32 - start.month as i32
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for Period {
    type Err = FinQueryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Period::parse(&text).map_err(serde::de::Error::custom)
    }
}

impl schemars::JsonSchema for Period {
    fn schema_name() -> String {
        "Period".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        let mut schema: schemars::schema::SchemaObject = <String>::json_schema(gen).into();
        schema.format = Some("YYYY-MM".to_string());
        schema.metadata().description =
            Some("Month-granularity period encoded as YYYY-MM".to_string());
        schema.into()
    }
}
