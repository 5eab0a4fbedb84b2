use crate::domain::loan::{LoanId, LoanState};
use crate::domain::party::PartyId;
use crate::domain::time::Timestamp;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("loan {0} not found")]
    NotFound(LoanId),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("cannot {operation} loan {id}: loan is {state}")]
    InvalidState {
        id: LoanId,
        state: LoanState,
        operation: &'static str,
    },
    #[error("loan {id} is not due until {due_date} (now {now})")]
    NotDue {
        id: LoanId,
        due_date: Timestamp,
        now: Timestamp,
    },
    #[error("{caller} is not the lender of loan {id}")]
    Unauthorized { id: LoanId, caller: PartyId },
    #[error("malformed command: {0}")]
    MalformedCommand(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
