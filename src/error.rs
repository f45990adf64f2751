use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinQueryError {
    #[error("Invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Invalid trailing window {0}: must cover at least 1 period")]
    InvalidWindow(usize),

    #[error("Cash history is empty: no latest balance to report")]
    EmptyCashHistory,

    #[error("Ledger is empty: no latest period to default to")]
    EmptyLedger,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FinQueryError>;
