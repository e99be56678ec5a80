use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("User not found: {0}")]
    UserNotFound(Uuid),
    #[error("Wallet not found for user: {0}")]
    WalletNotFound(Uuid),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Transaction PIN has not been set up")]
    PinNotConfigured,
    #[error("Invalid PIN: {attempts_remaining} attempt(s) remaining")]
    InvalidPin { attempts_remaining: u8 },
    #[error("Account locked, try again in {minutes_remaining} minute(s)")]
    AccountLocked { minutes_remaining: i64 },
    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        available: Decimal,
        required: Decimal,
    },
    #[error("Spending limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("Wallet is inactive")]
    WalletInactive,
    #[error("Duplicate transaction reference: {0}")]
    DuplicateReference(String),
    #[error("Transfer failed: {0}")]
    TransferFailed(String),
    #[error("Retry limit reached for transaction: {0}")]
    RetryExhausted(String),
    #[error("Unknown product type: {0}")]
    UnknownProduct(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for WalletError {
    fn from(e: rocksdb::Error) -> Self {
        WalletError::Storage(e.to_string())
    }
}
