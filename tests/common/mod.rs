#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use handpay::application::{EngineConfig, PaymentEngine};
use handpay::domain::chain::FixedClock;
use handpay::domain::ports::{LedgerStore, LedgerStoreRef, LedgerTxn};
use handpay::domain::transaction::{NewTransaction, Transaction};
use handpay::domain::user::{NewUser, User, UserId};
use handpay::domain::wallet::Wallet;
use handpay::error::{PaymentError, Result};
use handpay::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal::Decimal;
use std::sync::Arc;

pub fn engine() -> PaymentEngine {
    PaymentEngine::new(Arc::new(InMemoryLedgerStore::new()), EngineConfig::default())
}

pub fn engine_with_store(store: LedgerStoreRef) -> PaymentEngine {
    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
    PaymentEngine::with_clock(store, Arc::new(clock), EngineConfig::default())
}

pub fn engine_with_opening_balance(opening_balance: Decimal) -> PaymentEngine {
    PaymentEngine::new(
        Arc::new(InMemoryLedgerStore::new()),
        EngineConfig {
            currency: "EUR".to_string(),
            opening_balance,
        },
    )
}

/// Store operation that a [`FaultyStore`] refuses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fault {
    CreateWallet,
    UpdateWallet,
    AppendTransaction,
}

/// Wraps an in-memory store and fails one kind of write while `armed`.
#[derive(Clone)]
pub struct FaultyStore {
    pub inner: InMemoryLedgerStore,
    fault: Fault,
    armed: Arc<std::sync::atomic::AtomicBool>,
}

impl FaultyStore {
    pub fn new(fault: Fault) -> Self {
        Self {
            inner: InMemoryLedgerStore::new(),
            fault,
            armed: Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    pub fn arm(&self) {
        self.armed.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    fn fails(&self, fault: Fault) -> bool {
        self.fault == fault && self.armed.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerStore for FaultyStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTxn>> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyTxn {
            inner,
            store: self.clone(),
        }))
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

struct FaultyTxn {
    inner: Box<dyn LedgerTxn>,
    store: FaultyStore,
}

fn injected(what: &str) -> PaymentError {
    PaymentError::StorageError(format!("injected {what} failure"))
}

#[async_trait]
impl LedgerTxn for FaultyTxn {
    async fn create_user(&mut self, profile: NewUser) -> Result<User> {
        self.inner.create_user(profile).await
    }

    async fn find_user(&mut self, user_id: UserId) -> Result<User> {
        self.inner.find_user(user_id).await
    }

    async fn find_user_by_credentials(&mut self, email: &str, secret: &str) -> Result<User> {
        self.inner.find_user_by_credentials(email, secret).await
    }

    async fn update_user(&mut self, user: &User) -> Result<()> {
        self.inner.update_user(user).await
    }

    async fn create_wallet(
        &mut self,
        user_id: UserId,
        currency: &str,
        opening_balance: Decimal,
    ) -> Result<Wallet> {
        if self.store.fails(Fault::CreateWallet) {
            return Err(injected("wallet create"));
        }
        self.inner
            .create_wallet(user_id, currency, opening_balance)
            .await
    }

    async fn find_wallet_by_user(&mut self, user_id: UserId) -> Result<Wallet> {
        self.inner.find_wallet_by_user(user_id).await
    }

    async fn update_wallet(&mut self, wallet: &Wallet) -> Result<()> {
        if self.store.fails(Fault::UpdateWallet) {
            return Err(injected("wallet write"));
        }
        self.inner.update_wallet(wallet).await
    }

    async fn last_transaction(&mut self) -> Result<Option<Transaction>> {
        self.inner.last_transaction().await
    }

    async fn append_transaction(&mut self, tx: NewTransaction) -> Result<Transaction> {
        if self.store.fails(Fault::AppendTransaction) {
            return Err(injected("ledger append"));
        }
        self.inner.append_transaction(tx).await
    }

    async fn transactions(&mut self) -> Result<Vec<Transaction>> {
        self.inner.transactions().await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await
    }
}
