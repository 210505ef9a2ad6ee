use super::config::EngineConfig;
use crate::domain::chain::{ChainReport, Clock, GENESIS, SystemClock, chain_hash, verify_chain};
use crate::domain::ports::{LedgerStoreRef, LedgerTxn, LedgerTxnBox};
use crate::domain::transaction::{
    NewTransaction, Transaction, TransactionId, TransactionStatus, TransactionType,
};
use crate::domain::user::{NewUser, UserId};
use crate::domain::wallet::{Amount, WalletId};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Registration {
    pub user_id: UserId,
    pub wallet_id: WalletId,
    pub balance: Decimal,
    pub currency: String,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Login {
    pub user_id: UserId,
    pub name: String,
}

/// Outcome of a committed debit or credit.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub new_balance: Decimal,
    pub tx_hash: String,
    pub previous_hash: String,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct BalanceView {
    pub balance: Decimal,
    pub currency: String,
}

/// The main entry point for moving money.
///
/// `PaymentEngine` owns the ledger store and the clock it was constructed
/// with. Every mutating operation runs inside one store scope: it commits
/// only when every step succeeded and rolls back on the first error, so a
/// wallet debit is never persisted without its chained ledger entry.
pub struct PaymentEngine {
    store: LedgerStoreRef,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl PaymentEngine {
    /// Creates a new `PaymentEngine` stamping records with the system clock.
    pub fn new(store: LedgerStoreRef, config: EngineConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    /// Creates a new `PaymentEngine` with an explicit time source.
    ///
    /// # Arguments
    ///
    /// * `store` - The ledger store holding users, wallets and the chain.
    /// * `clock` - Time source for timestamps and chain hashes.
    /// * `config` - Currency and opening balance for new wallets.
    pub fn with_clock(store: LedgerStoreRef, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Creates a user and its wallet with the configured opening balance.
    ///
    /// Both rows are written in one scope. If the wallet cannot be created the
    /// user is discarded too and `PartialRegistration` is returned.
    pub async fn register(
        &self,
        name: &str,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<Registration> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PaymentError::InvalidInput("name must not be empty".to_string()));
        }
        let profile = NewUser {
            full_name: name.to_string(),
            email: email.and_then(normalize_email),
            password: password.filter(|p| !p.is_empty()).map(str::to_string),
        };

        let mut txn = self.store.begin().await?;
        let outcome = self.create_account(txn.as_mut(), profile).await;
        let registration = finish(txn, outcome).await.inspect_err(|err| {
            tracing::warn!(error = %err, "Registration rejected");
        })?;

        tracing::info!(
            user_id = registration.user_id,
            wallet_id = registration.wallet_id,
            balance = %registration.balance,
            "Registered user"
        );
        Ok(registration)
    }

    async fn create_account(
        &self,
        txn: &mut dyn LedgerTxn,
        profile: NewUser,
    ) -> Result<Registration> {
        let user = txn.create_user(profile).await?;
        let wallet = txn
            .create_wallet(user.id, &self.config.currency, self.config.opening_balance)
            .await
            .map_err(|err| PaymentError::PartialRegistration {
                user_id: user.id,
                reason: err.to_string(),
            })?;

        Ok(Registration {
            user_id: user.id,
            wallet_id: wallet.id,
            balance: wallet.balance,
            currency: wallet.currency,
        })
    }

    /// Email is normalized as at registration; the password must match verbatim.
    pub async fn login(&self, email: &str, password: &str) -> Result<Login> {
        let Some(email) = normalize_email(email) else {
            return Err(PaymentError::Unauthorized);
        };

        let mut txn = self.store.begin().await?;
        let user = txn.find_user_by_credentials(&email, password).await;
        txn.rollback().await?;

        let user = user?;
        Ok(Login {
            user_id: user.id,
            name: user.full_name,
        })
    }

    /// Marks the user's hand enrolment as linked.
    ///
    /// Resolving the token to an identity happens elsewhere; only the status
    /// flag is recorded here.
    pub async fn link_hand(&self, user_id: UserId, hand_token: &str) -> Result<()> {
        if hand_token.trim().is_empty() {
            return Err(PaymentError::InvalidInput(
                "hand_token must not be empty".to_string(),
            ));
        }

        let mut txn = self.store.begin().await?;
        let outcome: Result<()> = async {
            let mut user = txn.find_user(user_id).await?;
            user.hand_status = user.hand_status.link();
            txn.update_user(&user).await
        }
        .await;
        finish(txn, outcome).await?;

        tracing::info!(user_id, "Linked hand to user");
        Ok(())
    }

    /// Debits the payer's wallet and appends a chained `PAYMENT` entry.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` when `amount <= 0`; nothing is touched.
    /// * `WalletNotFound` when the user has no wallet.
    /// * `InsufficientFunds` when the balance does not cover `amount`.
    /// * `StorageError` when the wallet write fails.
    /// * `LedgerWriteError` when the entry cannot be appended.
    ///
    /// Every error after validation rolls the whole scope back.
    pub async fn pay(&self, user_id: UserId, amount: Decimal, hand_token: &str) -> Result<Receipt> {
        let amount = Amount::try_from(amount).inspect_err(|err| {
            tracing::warn!(user_id, error = %err, "Payment rejected");
        })?;

        let mut txn = self.store.begin().await?;
        let outcome = self.debit_and_chain(txn.as_mut(), user_id, amount, hand_token).await;
        let receipt = finish(txn, outcome).await.inspect_err(|err| {
            tracing::warn!(user_id, amount = %amount.value(), error = %err, "Payment rejected");
        })?;

        tracing::info!(
            user_id,
            amount = %amount.value(),
            new_balance = %receipt.new_balance,
            tx_hash = %receipt.tx_hash,
            "Payment committed"
        );
        Ok(receipt)
    }

    async fn debit_and_chain(
        &self,
        txn: &mut dyn LedgerTxn,
        user_id: UserId,
        amount: Amount,
        hand_token: &str,
    ) -> Result<Receipt> {
        let mut wallet = txn.find_wallet_by_user(user_id).await?;
        let now = self.clock.now();

        wallet.debit(amount, now)?;
        txn.update_wallet(&wallet).await.map_err(into_storage_error)?;

        let tx = append_chained(
            txn,
            wallet.id,
            -amount.value(),
            TransactionType::Payment,
            hand_token,
            now,
        )
        .await?;

        Ok(Receipt {
            transaction_id: tx.id,
            new_balance: wallet.balance,
            tx_hash: tx.hash,
            previous_hash: tx.previous_hash,
        })
    }

    /// Tops up the user's wallet and appends a chained `DEPOSIT` entry.
    pub async fn credit(&self, user_id: UserId, amount: Decimal) -> Result<Receipt> {
        let amount = Amount::try_from(amount)?;

        let mut txn = self.store.begin().await?;
        let outcome = self.credit_and_chain(txn.as_mut(), user_id, amount).await;
        let receipt = finish(txn, outcome).await.inspect_err(|err| {
            tracing::warn!(user_id, error = %err, "Credit rejected");
        })?;

        tracing::info!(
            user_id,
            amount = %amount.value(),
            new_balance = %receipt.new_balance,
            tx_hash = %receipt.tx_hash,
            "Credit committed"
        );
        Ok(receipt)
    }

    async fn credit_and_chain(
        &self,
        txn: &mut dyn LedgerTxn,
        user_id: UserId,
        amount: Amount,
    ) -> Result<Receipt> {
        let mut wallet = txn.find_wallet_by_user(user_id).await?;
        let now = self.clock.now();

        wallet.credit(amount, now)?;
        txn.update_wallet(&wallet).await.map_err(into_storage_error)?;

        let tx = append_chained(
            txn,
            wallet.id,
            amount.value(),
            TransactionType::Deposit,
            "",
            now,
        )
        .await?;

        Ok(Receipt {
            transaction_id: tx.id,
            new_balance: wallet.balance,
            tx_hash: tx.hash,
            previous_hash: tx.previous_hash,
        })
    }

    /// Paying a merchant by scanning the customer's hand needs payer
    /// identification, which this service does not provide.
    pub async fn merchant_pay(
        &self,
        _merchant_id: UserId,
        _amount: Decimal,
        _hand_token: &str,
    ) -> Result<Receipt> {
        Err(PaymentError::NotImplemented("merchant payment by hand scan"))
    }

    pub async fn get_balance(&self, user_id: UserId) -> Result<BalanceView> {
        let mut txn = self.store.begin().await?;
        let wallet = txn.find_wallet_by_user(user_id).await;
        txn.rollback().await?;

        let wallet = wallet?;
        Ok(BalanceView {
            balance: wallet.balance,
            currency: wallet.currency,
        })
    }

    /// Ledger entries of the user's wallet, oldest first.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        let mut txn = self.store.begin().await?;
        let outcome: Result<Vec<Transaction>> = async {
            let wallet = txn.find_wallet_by_user(user_id).await?;
            let all = txn.transactions().await?;
            Ok(all
                .into_iter()
                .filter(|tx| tx.wallet_id == wallet.id)
                .collect())
        }
        .await;
        txn.rollback().await?;
        outcome
    }

    /// The full chain, oldest first.
    pub async fn ledger(&self) -> Result<Vec<Transaction>> {
        let mut txn = self.store.begin().await?;
        let all = txn.transactions().await;
        txn.rollback().await?;
        all
    }

    /// Re-hashes every entry and checks each link back to `GENESIS`.
    pub async fn verify_chain(&self) -> Result<ChainReport> {
        let transactions = self.ledger().await?;
        let report = verify_chain(&transactions).inspect_err(|err| {
            tracing::error!(error = %err, "Ledger chain verification failed");
        })?;
        tracing::info!(length = report.length, head = %report.head, "Ledger chain verified");
        Ok(report)
    }

    /// Releases the store. Call once when the process stops.
    pub async fn shutdown(&self) -> Result<()> {
        self.store.close().await
    }
}

/// Commits on success, rolls back otherwise. The operation error wins over a
/// failed rollback.
async fn finish<T>(txn: LedgerTxnBox, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            txn.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

/// Chains a new entry onto the current head, or onto `GENESIS` for an empty
/// ledger.
async fn append_chained(
    txn: &mut dyn LedgerTxn,
    wallet_id: WalletId,
    amount: Decimal,
    r#type: TransactionType,
    hand_token: &str,
    now: DateTime<Utc>,
) -> Result<Transaction> {
    let previous_hash = txn
        .last_transaction()
        .await?
        .map_or_else(|| GENESIS.to_string(), |tx| tx.hash);
    let hash = chain_hash(wallet_id, amount, &previous_hash, hand_token, now);

    txn.append_transaction(NewTransaction {
        wallet_id,
        amount,
        r#type,
        status: TransactionStatus::Success,
        previous_hash,
        hash,
        hand_token: hand_token.to_string(),
        created_at: now,
    })
    .await
    .map_err(|err| match err {
        PaymentError::LedgerWriteError(_) => err,
        other => PaymentError::LedgerWriteError(other.to_string()),
    })
}

fn into_storage_error(err: PaymentError) -> PaymentError {
    match err {
        PaymentError::StorageError(_) => err,
        other => PaymentError::StorageError(other.to_string()),
    }
}

fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();
    (!email.is_empty()).then(|| email.to_string())
}
