use thiserror::Error;

use crate::decimal::Money;
use crate::types::{InstallmentId, InstallmentStatus};

/// schedule generation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid template: {message}")]
    InvalidTemplate { message: String },
}

impl ScheduleError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ScheduleError::InvalidTemplate {
            message: message.into(),
        }
    }
}

/// ledger mutation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("installment not found: {id}")]
    NotFound { id: InstallmentId },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount { amount: Money },

    #[error("overpayment on installment {id}: outstanding {outstanding}, attempted {attempted}")]
    OverPayment {
        id: InstallmentId,
        outstanding: Money,
        attempted: Money,
    },

    #[error("installment {id} cannot accept payments while {status}")]
    InstallmentNotPayable {
        id: InstallmentId,
        status: InstallmentStatus,
    },

    #[error("installment {id} cannot be waived while {status}")]
    InstallmentNotWaivable {
        id: InstallmentId,
        status: InstallmentStatus,
    },

    #[error("waiver of installment {id} needs a reason")]
    MissingWaiverReason { id: InstallmentId },

    #[error("ledger invariant violated: paid {paid} + pending {pending} != total {total}")]
    InvariantViolation {
        paid: Money,
        pending: Money,
        total: Money,
    },

    #[error("ledger inconsistent: {detail}")]
    Inconsistent { detail: String },

    #[error("ledger arithmetic overflow: {context}")]
    ArithmeticOverflow { context: String },
}

impl LedgerError {
    /// the caller may retry with corrected input
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::OverPayment { .. } | LedgerError::InvalidPaymentAmount { .. }
        )
    }

    /// internal bug, the operation was aborted and an incident must be raised
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LedgerError::InvariantViolation { .. }
                | LedgerError::Inconsistent { .. }
                | LedgerError::ArithmeticOverflow { .. }
        )
    }
}

/// failures converting persisted rows into engine types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("column {column}: {message}")]
    InvalidColumn {
        column: &'static str,
        message: String,
    },

    #[error("stored plan rejected: {0}")]
    Plan(#[from] ScheduleError),

    #[error("stored ledger rejected: {0}")]
    Ledger(#[from] LedgerError),
}

impl RecordError {
    pub(crate) fn column(column: &'static str, message: impl Into<String>) -> Self {
        RecordError::InvalidColumn {
            column,
            message: message.into(),
        }
    }
}

/// configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

/// umbrella error for the booking aggregate and the sweep
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("booking lock poisoned: {booking}")]
    LockPoisoned { booking: String },
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
