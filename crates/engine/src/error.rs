//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a medicine, ledger row or counterparty is
//!   missing.
//! - [`InsufficientStock`] thrown when a decrement would push stock below 0.
//! - [`InvalidAmount`] thrown when an input fails validation.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientStock`]: EngineError::InsufficientStock
//!  [`InvalidAmount`]: EngineError::InvalidAmount
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("\"{0}\" is still referenced")]
    Referenced(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Backup error: {0}")]
    Backup(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InsufficientStock(a), Self::InsufficientStock(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Referenced(a), Self::Referenced(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Backup(a), Self::Backup(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
