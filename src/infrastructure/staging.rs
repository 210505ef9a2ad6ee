use crate::domain::transaction::Transaction;
use crate::domain::user::{User, UserId};
use crate::domain::wallet::{Wallet, WalletId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last identifiers handed out for each entity kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    pub user: UserId,
    pub wallet: WalletId,
    pub transaction: u64,
}

impl Sequences {
    pub fn next_user(&mut self) -> UserId {
        self.user += 1;
        self.user
    }

    pub fn next_wallet(&mut self) -> WalletId {
        self.wallet += 1;
        self.wallet
    }

    pub fn next_transaction(&mut self) -> u64 {
        self.transaction += 1;
        self.transaction
    }
}

/// Writes buffered by an open ledger scope.
///
/// Reads consult the staged rows first and fall back to committed state.
/// Committing applies every row at once; dropping the buffer discards them.
#[derive(Debug, Default)]
pub struct Staged {
    pub users: BTreeMap<UserId, User>,
    pub emails: BTreeMap<String, UserId>,
    pub wallets: BTreeMap<WalletId, Wallet>,
    pub wallet_by_user: BTreeMap<UserId, WalletId>,
    pub transactions: Vec<Transaction>,
    pub sequences: Sequences,
}

impl Staged {
    pub fn new(sequences: Sequences) -> Self {
        Self {
            sequences,
            ..Self::default()
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.wallets.is_empty() && self.transactions.is_empty()
    }
}
