use std::io;

use shop_domain::{InvoiceNumberError, InvoiceStateError, InvoiceValidationError, ScheduleRangeError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),
    #[error("Invoice number already exists: {0}")]
    DuplicateInvoiceNumber(String),
    #[error("Invoice id already exists: {0}")]
    DuplicateInvoiceId(Uuid),
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<InvoiceValidationError> for CoreError {
    fn from(err: InvoiceValidationError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

impl From<InvoiceStateError> for CoreError {
    fn from(err: InvoiceStateError) -> Self {
        CoreError::InvalidOperation(err.to_string())
    }
}

impl From<InvoiceNumberError> for CoreError {
    fn from(err: InvoiceNumberError) -> Self {
        CoreError::Validation(err.to_string())
    }
}

impl From<ScheduleRangeError> for CoreError {
    fn from(err: ScheduleRangeError) -> Self {
        CoreError::Validation(err.to_string())
    }
}
