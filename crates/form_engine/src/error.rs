//! The module contains the errors the form session can throw.
//!
//! These cover misuse of the session API (unknown keys, locked rows, bad
//! amounts). Validation problems shown to the user are not errors; they are
//! collected as plain messages at submission time.

use thiserror::Error;

/// Form session errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Invalid transaction type: {0}")]
    InvalidType(String),
    #[error("Locked entry: {0}")]
    LockedEntry(String),
    #[error("Limit reached: {0}")]
    LimitReached(String),
}
