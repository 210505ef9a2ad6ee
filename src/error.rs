use crate::domain::transaction::TransactionId;
use crate::domain::user::UserId;
use crate::domain::wallet::WalletId;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

/// Every failure the ledger core can surface to a caller.
///
/// Payment failures never leave partial state behind: the enclosing ledger
/// scope is rolled back before the error is returned.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Decimal),
    #[error("{field} '{value}' is already registered")]
    DuplicateKey { field: &'static str, value: String },
    #[error("Invalid email or password")]
    Unauthorized,
    #[error("User {0} not found")]
    UserNotFound(UserId),
    #[error("No wallet found for user {0}")]
    WalletNotFound(UserId),
    #[error("Insufficient funds in wallet {wallet}: available {available}, requested {requested}")]
    InsufficientFunds {
        wallet: WalletId,
        available: Decimal,
        requested: Decimal,
    },
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Ledger write error: {0}")]
    LedgerWriteError(String),
    #[error("User {user_id} was created but wallet creation failed: {reason}")]
    PartialRegistration { user_id: UserId, reason: String },
    #[error("Ledger chain broken at transaction {transaction_id}: {reason}")]
    ChainBroken {
        transaction_id: TransactionId,
        reason: String,
    },
    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl PaymentError {
    /// Stable, caller-visible code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UserNotFound(_) | Self::WalletNotFound(_) => "NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::StorageError(_) | Self::InternalError(_) => "STORAGE_ERROR",
            Self::LedgerWriteError(_) => "LEDGER_WRITE_ERROR",
            Self::PartialRegistration { .. } => "PARTIAL_REGISTRATION",
            Self::ChainBroken { .. } => "CHAIN_BROKEN",
            Self::NotImplemented(_) => "NOT_IMPLEMENTED",
        }
    }

    /// True for conditions the caller can fix by changing the request.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::InvalidAmount(_)
                | Self::DuplicateKey { .. }
                | Self::Unauthorized
                | Self::UserNotFound(_)
                | Self::WalletNotFound(_)
                | Self::InsufficientFunds { .. }
        )
    }

    #[cfg(feature = "storage-rocksdb")]
    pub(crate) fn serialization(err: serde_json::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}

impl From<csv::Error> for PaymentError {
    fn from(err: csv::Error) -> Self {
        Self::InternalError(Box::new(err))
    }
}

impl From<std::io::Error> for PaymentError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        Self::StorageError(err.into_string())
    }
}
