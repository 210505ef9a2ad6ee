use super::transaction::{NewTransaction, Transaction};
use super::user::{NewUser, User, UserId};
use super::wallet::Wallet;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Durable storage for users, wallets and the ledger chain.
///
/// All reads and writes go through a [`LedgerTxn`] obtained from [`begin`].
/// Scopes are serialized: at most one is open at a time.
///
/// [`begin`]: LedgerStore::begin
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens an atomic unit of work, waiting for any open scope to finish.
    async fn begin(&self) -> Result<Box<dyn LedgerTxn>>;

    /// Flushes pending state. Called once at process shutdown.
    async fn close(&self) -> Result<()>;
}

/// A scoped atomic unit of work.
///
/// Mutations are visible to other scopes only after [`commit`]. A scope that
/// is rolled back or dropped without commit discards everything it staged.
///
/// [`commit`]: LedgerTxn::commit
#[async_trait]
pub trait LedgerTxn: Send {
    async fn create_user(&mut self, profile: NewUser) -> Result<User>;
    async fn find_user(&mut self, user_id: UserId) -> Result<User>;
    async fn find_user_by_credentials(&mut self, email: &str, secret: &str) -> Result<User>;
    async fn update_user(&mut self, user: &User) -> Result<()>;

    async fn create_wallet(
        &mut self,
        user_id: UserId,
        currency: &str,
        opening_balance: Decimal,
    ) -> Result<Wallet>;
    async fn find_wallet_by_user(&mut self, user_id: UserId) -> Result<Wallet>;
    async fn update_wallet(&mut self, wallet: &Wallet) -> Result<()>;

    /// The most recently created entry across the whole ledger.
    async fn last_transaction(&mut self) -> Result<Option<Transaction>>;
    async fn append_transaction(&mut self, tx: NewTransaction) -> Result<Transaction>;
    /// Every entry in creation order.
    async fn transactions(&mut self) -> Result<Vec<Transaction>>;

    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type LedgerTxnBox = Box<dyn LedgerTxn>;
