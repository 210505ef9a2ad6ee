use super::wallet::WalletId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type TransactionId = u64;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Payment,
    Deposit,
}

/// Set once at creation and never changed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    #[default]
    Success,
    Failed,
}

/// A ledger entry that has been chained but not yet given an id by the store.
#[derive(Debug, PartialEq, Clone)]
pub struct NewTransaction {
    pub wallet_id: WalletId,
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub status: TransactionStatus,
    pub previous_hash: String,
    pub hash: String,
    pub hand_token: String,
    pub created_at: DateTime<Utc>,
}

/// An immutable, append-only ledger entry.
///
/// `amount` is signed: debits are negative, credits positive. `previous_hash`
/// links to the entry committed immediately before this one across all wallets.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub wallet_id: WalletId,
    pub amount: Decimal,
    pub r#type: TransactionType,
    pub status: TransactionStatus,
    pub previous_hash: String,
    pub hash: String,
    pub hand_token: String,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            wallet_id: self.wallet_id,
            amount: self.amount,
            r#type: self.r#type,
            status: self.status,
            previous_hash: self.previous_hash,
            hash: self.hash,
            hand_token: self.hand_token,
            created_at: self.created_at,
        }
    }
}
