use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Coarse classification of [`EngineError`], stable across variants that
/// carry different context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AmountInvalid,
    PeriodInvalid,
    NameInvalid,
    OverlapExists,
    AlreadyExceeded,
    InsufficientFunds,
    CalculationFailed,
    DeadlineExceeded,
}

impl ErrorKind {
    /// Machine readable code used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "BUDGET_NOT_FOUND",
            ErrorKind::AmountInvalid => "AMOUNT_INVALID",
            ErrorKind::PeriodInvalid => "PERIOD_INVALID",
            ErrorKind::NameInvalid => "NAME_INVALID",
            ErrorKind::OverlapExists => "OVERLAP_EXISTS",
            ErrorKind::AlreadyExceeded => "ALREADY_EXCEEDED",
            ErrorKind::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorKind::CalculationFailed => "CALCULATION_FAILED",
            ErrorKind::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }
}

/// Error types for the budget engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// The requested budget does not exist
    #[error("Budget not found: {0}")]
    NotFound(i32),

    /// Budget amount is zero or negative
    #[error("Budget amount must be greater than zero, got {0}")]
    AmountInvalid(Decimal),

    /// Budget window ends before it starts
    #[error("Budget end date {end} is before start date {start}")]
    PeriodInvalid { start: NaiveDate, end: NaiveDate },

    /// Budget name is empty
    #[error("Budget name must not be empty")]
    NameInvalid,

    /// Another budget of the same scope already covers part of the window
    #[error("Budget period overlaps with budget '{name}'")]
    OverlapExists { budget_id: i32, name: String },

    /// New amount is below what has already been spent
    #[error("Budget amount {amount} is below the amount already spent ({spent})")]
    AlreadyExceeded { amount: Decimal, spent: Decimal },

    /// A proposed expense does not fit into a budget
    #[error(
        "Insufficient funds in budget '{name}': {available} available, {requested} requested"
    )]
    InsufficientFunds {
        budget_id: i32,
        name: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Recomputing the spent amount from the ledger failed
    #[error("Calculation failed during {operation}: {source}")]
    CalculationFailed {
        operation: &'static str,
        #[source]
        source: Box<EngineError>,
    },

    /// A budget store call failed
    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: Box<EngineError>,
    },

    /// A money calculation left the representable decimal range
    #[error("Arithmetic overflow during {operation}")]
    Overflow { operation: &'static str },

    /// A store or ledger call did not finish within the configured deadline
    #[error("Deadline exceeded during {operation}")]
    DeadlineExceeded { operation: &'static str },

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::AmountInvalid(_) => ErrorKind::AmountInvalid,
            EngineError::PeriodInvalid { .. } => ErrorKind::PeriodInvalid,
            EngineError::NameInvalid => ErrorKind::NameInvalid,
            EngineError::OverlapExists { .. } => ErrorKind::OverlapExists,
            EngineError::AlreadyExceeded { .. } => ErrorKind::AlreadyExceeded,
            EngineError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            EngineError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            EngineError::CalculationFailed { .. }
            | EngineError::Overflow { .. }
            | EngineError::Storage { .. }
            | EngineError::Database(_) => ErrorKind::CalculationFailed,
        }
    }

    /// Wraps a store failure with the name of the enclosing operation.
    ///
    /// Deadlines, missing budgets and already wrapped errors pass through.
    pub(crate) fn in_storage(self, operation: &'static str) -> Self {
        match self {
            e @ (EngineError::DeadlineExceeded { .. }
            | EngineError::Storage { .. }
            | EngineError::NotFound(_)) => e,
            e => EngineError::Storage {
                operation,
                source: Box::new(e),
            },
        }
    }

    /// Wraps a ledger failure with the name of the enclosing operation.
    pub(crate) fn in_calculation(self, operation: &'static str) -> Self {
        match self {
            e @ (EngineError::DeadlineExceeded { .. } | EngineError::CalculationFailed { .. }) => e,
            e => EngineError::CalculationFailed {
                operation,
                source: Box::new(e),
            },
        }
    }
}

/// Type alias for Result with EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
