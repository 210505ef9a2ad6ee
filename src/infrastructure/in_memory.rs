use super::staging::{Sequences, Staged};
use crate::domain::ports::{LedgerStore, LedgerTxn};
use crate::domain::transaction::{NewTransaction, Transaction};
use crate::domain::user::{NewUser, User, UserId};
use crate::domain::wallet::{Wallet, WalletId};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct LedgerState {
    users: HashMap<UserId, User>,
    emails: HashMap<String, UserId>,
    wallets: HashMap<WalletId, Wallet>,
    wallet_by_user: HashMap<UserId, WalletId>,
    transactions: Vec<Transaction>,
    sequences: Sequences,
}

/// A thread-safe in-memory ledger store.
///
/// Uses `Arc<Mutex<..>>` so clones share the same ledger. A scope owns the
/// mutex guard for its whole lifetime, which serializes all scopes.
/// Ideal for testing or deployments where persistence is not required.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTxn>> {
        let state = Arc::clone(&self.state).lock_owned().await;
        let staged = Staged::new(state.sequences);
        Ok(Box::new(InMemoryTxn { state, staged }))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

struct InMemoryTxn {
    state: OwnedMutexGuard<LedgerState>,
    staged: Staged,
}

impl InMemoryTxn {
    fn user(&self, user_id: UserId) -> Option<&User> {
        self.staged
            .users
            .get(&user_id)
            .or_else(|| self.state.users.get(&user_id))
    }

    fn user_id_by_email(&self, email: &str) -> Option<UserId> {
        self.staged
            .emails
            .get(email)
            .or_else(|| self.state.emails.get(email))
            .copied()
    }

    fn wallet(&self, wallet_id: WalletId) -> Option<&Wallet> {
        self.staged
            .wallets
            .get(&wallet_id)
            .or_else(|| self.state.wallets.get(&wallet_id))
    }

    fn wallet_id_by_user(&self, user_id: UserId) -> Option<WalletId> {
        self.staged
            .wallet_by_user
            .get(&user_id)
            .or_else(|| self.state.wallet_by_user.get(&user_id))
            .copied()
    }
}

#[async_trait]
impl LedgerTxn for InMemoryTxn {
    async fn create_user(&mut self, profile: NewUser) -> Result<User> {
        if let Some(email) = profile.email.as_deref()
            && self.user_id_by_email(email).is_some()
        {
            return Err(PaymentError::DuplicateKey {
                field: "email",
                value: email.to_string(),
            });
        }

        let id = self.staged.sequences.next_user();
        let user = User::from_profile(id, profile, Utc::now());
        if let Some(email) = &user.email {
            self.staged.emails.insert(email.clone(), id);
        }
        self.staged.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&mut self, user_id: UserId) -> Result<User> {
        self.user(user_id)
            .cloned()
            .ok_or(PaymentError::UserNotFound(user_id))
    }

    async fn find_user_by_credentials(&mut self, email: &str, secret: &str) -> Result<User> {
        self.user_id_by_email(email)
            .and_then(|id| self.user(id))
            .filter(|user| user.matches_credentials(email, secret))
            .cloned()
            .ok_or(PaymentError::Unauthorized)
    }

    async fn update_user(&mut self, user: &User) -> Result<()> {
        if self.user(user.id).is_none() {
            return Err(PaymentError::UserNotFound(user.id));
        }
        self.staged.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn create_wallet(
        &mut self,
        user_id: UserId,
        currency: &str,
        opening_balance: Decimal,
    ) -> Result<Wallet> {
        if self.user(user_id).is_none() {
            return Err(PaymentError::UserNotFound(user_id));
        }
        if self.wallet_id_by_user(user_id).is_some() {
            return Err(PaymentError::DuplicateKey {
                field: "wallet owner",
                value: user_id.to_string(),
            });
        }

        let id = self.staged.sequences.next_wallet();
        let wallet = Wallet::new(id, user_id, currency, opening_balance, Utc::now());
        self.staged.wallet_by_user.insert(user_id, id);
        self.staged.wallets.insert(id, wallet.clone());
        Ok(wallet)
    }

    async fn find_wallet_by_user(&mut self, user_id: UserId) -> Result<Wallet> {
        self.wallet_id_by_user(user_id)
            .and_then(|id| self.wallet(id))
            .cloned()
            .ok_or(PaymentError::WalletNotFound(user_id))
    }

    async fn update_wallet(&mut self, wallet: &Wallet) -> Result<()> {
        if self.wallet(wallet.id).is_none() {
            return Err(PaymentError::WalletNotFound(wallet.user_id));
        }
        self.staged.wallets.insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn last_transaction(&mut self) -> Result<Option<Transaction>> {
        Ok(self
            .staged
            .transactions
            .last()
            .or_else(|| self.state.transactions.last())
            .cloned())
    }

    async fn append_transaction(&mut self, tx: NewTransaction) -> Result<Transaction> {
        let id = self.staged.sequences.next_transaction();
        let tx = tx.into_transaction(id);
        self.staged.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn transactions(&mut self) -> Result<Vec<Transaction>> {
        Ok(self
            .state
            .transactions
            .iter()
            .chain(self.staged.transactions.iter())
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTxn { mut state, staged } = *self;
        state.users.extend(staged.users);
        state.emails.extend(staged.emails);
        state.wallets.extend(staged.wallets);
        state.wallet_by_user.extend(staged.wallet_by_user);
        state.transactions.extend(staged.transactions);
        state.sequences = staged.sequences;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        // Dropping the staged rows and the guard is the whole rollback.
        Ok(())
    }
}
