use super::staging::{Sequences, Staged};
use crate::domain::ports::{LedgerStore, LedgerTxn};
use crate::domain::transaction::{NewTransaction, Transaction};
use crate::domain::user::{NewUser, User, UserId};
use crate::domain::wallet::{Wallet, WalletId};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Column Family for user records, keyed by big-endian user id.
pub const CF_USERS: &str = "users";
/// Column Family mapping email to user id.
pub const CF_USER_EMAILS: &str = "user_emails";
/// Column Family for wallet records, keyed by big-endian wallet id.
pub const CF_WALLETS: &str = "wallets";
/// Column Family mapping user id to wallet id.
pub const CF_USER_WALLETS: &str = "user_wallets";
/// Column Family for the ledger chain, keyed by big-endian transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for bookkeeping such as id sequences.
pub const CF_META: &str = "meta";

const SEQUENCES_KEY: &[u8] = b"sequences";

const COLUMN_FAMILIES: [&str; 6] = [
    CF_USERS,
    CF_USER_EMAILS,
    CF_WALLETS,
    CF_USER_WALLETS,
    CF_TRANSACTIONS,
    CF_META,
];

/// A persistent ledger store implementation using RocksDB.
///
/// Each entity kind lives in its own Column Family. Big-endian keys keep the
/// transactions Column Family in creation order, so the chain head is the
/// last key. A scope buffers its writes and applies them in one `WriteBatch`
/// on commit.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Creates any missing Column Family, which doubles as the schema
    /// migration on startup.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        tracing::info!(path = %db.path().display(), "Opened RocksDB ledger store");

        Ok(Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
        })
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTxn>> {
        let guard = Arc::clone(&self.writer).lock_owned().await;
        let sequences = get_json(&self.db, CF_META, SEQUENCES_KEY)?.unwrap_or_default();
        Ok(Box::new(RocksDBTxn {
            db: Arc::clone(&self.db),
            _guard: guard,
            staged: Staged::new(sequences),
        }))
    }

    async fn close(&self) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.db.flush()?;
        tracing::info!("Flushed RocksDB ledger store");
        Ok(())
    }
}

fn cf<'a>(db: &'a DB, name: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(name).ok_or_else(|| {
        PaymentError::StorageError(format!("{name} column family not found"))
    })
}

fn get_json<T: DeserializeOwned>(db: &DB, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
    let handle = cf(db, cf_name)?;
    match db.get_cf(handle, key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(PaymentError::serialization),
        None => Ok(None),
    }
}

fn get_id(db: &DB, cf_name: &str, key: &[u8]) -> Result<Option<u64>> {
    let handle = cf(db, cf_name)?;
    match db.get_cf(handle, key)? {
        Some(bytes) => {
            let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                PaymentError::StorageError(format!("corrupt id in {cf_name} column family"))
            })?;
            Ok(Some(u64::from_be_bytes(raw)))
        }
        None => Ok(None),
    }
}

fn put_json<T: Serialize>(
    db: &DB,
    batch: &mut WriteBatch,
    cf_name: &str,
    key: &[u8],
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value).map_err(PaymentError::serialization)?;
    batch.put_cf(cf(db, cf_name)?, key, bytes);
    Ok(())
}

struct RocksDBTxn {
    db: Arc<DB>,
    _guard: OwnedMutexGuard<()>,
    staged: Staged,
}

impl RocksDBTxn {
    fn user(&self, user_id: UserId) -> Result<Option<User>> {
        if let Some(user) = self.staged.users.get(&user_id) {
            return Ok(Some(user.clone()));
        }
        get_json(&self.db, CF_USERS, &user_id.to_be_bytes())
    }

    fn user_id_by_email(&self, email: &str) -> Result<Option<UserId>> {
        if let Some(id) = self.staged.emails.get(email) {
            return Ok(Some(*id));
        }
        get_id(&self.db, CF_USER_EMAILS, email.as_bytes())
    }

    fn wallet(&self, wallet_id: WalletId) -> Result<Option<Wallet>> {
        if let Some(wallet) = self.staged.wallets.get(&wallet_id) {
            return Ok(Some(wallet.clone()));
        }
        get_json(&self.db, CF_WALLETS, &wallet_id.to_be_bytes())
    }

    fn wallet_id_by_user(&self, user_id: UserId) -> Result<Option<WalletId>> {
        if let Some(id) = self.staged.wallet_by_user.get(&user_id) {
            return Ok(Some(*id));
        }
        get_id(&self.db, CF_USER_WALLETS, &user_id.to_be_bytes())
    }

    fn committed_transactions(&self, mode: IteratorMode<'_>) -> Result<Vec<Transaction>> {
        let handle = cf(&self.db, CF_TRANSACTIONS)?;
        let mut transactions = Vec::new();
        for item in self.db.iterator_cf(handle, mode) {
            let (_key, value) = item?;
            let tx: Transaction =
                serde_json::from_slice(&value).map_err(PaymentError::serialization)?;
            transactions.push(tx);
        }
        Ok(transactions)
    }
}

#[async_trait]
impl LedgerTxn for RocksDBTxn {
    async fn create_user(&mut self, profile: NewUser) -> Result<User> {
        if let Some(email) = profile.email.as_deref()
            && self.user_id_by_email(email)?.is_some()
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
        self.user(user_id)?.ok_or(PaymentError::UserNotFound(user_id))
    }

    async fn find_user_by_credentials(&mut self, email: &str, secret: &str) -> Result<User> {
        let Some(id) = self.user_id_by_email(email)? else {
            return Err(PaymentError::Unauthorized);
        };
        self.user(id)?
            .filter(|user| user.matches_credentials(email, secret))
            .ok_or(PaymentError::Unauthorized)
    }

    async fn update_user(&mut self, user: &User) -> Result<()> {
        if self.user(user.id)?.is_none() {
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
        if self.user(user_id)?.is_none() {
            return Err(PaymentError::UserNotFound(user_id));
        }
        if self.wallet_id_by_user(user_id)?.is_some() {
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
        let Some(id) = self.wallet_id_by_user(user_id)? else {
            return Err(PaymentError::WalletNotFound(user_id));
        };
        self.wallet(id)?.ok_or(PaymentError::WalletNotFound(user_id))
    }

    async fn update_wallet(&mut self, wallet: &Wallet) -> Result<()> {
        if self.wallet(wallet.id)?.is_none() {
            return Err(PaymentError::WalletNotFound(wallet.user_id));
        }
        self.staged.wallets.insert(wallet.id, wallet.clone());
        Ok(())
    }

    async fn last_transaction(&mut self) -> Result<Option<Transaction>> {
        if let Some(tx) = self.staged.transactions.last() {
            return Ok(Some(tx.clone()));
        }
        let handle = cf(&self.db, CF_TRANSACTIONS)?;
        match self.db.iterator_cf(handle, IteratorMode::End).next() {
            Some(item) => {
                let (_key, value) = item?;
                serde_json::from_slice(&value)
                    .map(Some)
                    .map_err(PaymentError::serialization)
            }
            None => Ok(None),
        }
    }

    async fn append_transaction(&mut self, tx: NewTransaction) -> Result<Transaction> {
        let id = self.staged.sequences.next_transaction();
        let tx = tx.into_transaction(id);
        self.staged.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn transactions(&mut self) -> Result<Vec<Transaction>> {
        let mut transactions = self.committed_transactions(IteratorMode::Start)?;
        transactions.extend(self.staged.transactions.iter().cloned());
        Ok(transactions)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let db = &self.db;
        let staged = &self.staged;
        let mut batch = WriteBatch::default();

        for (id, user) in &staged.users {
            put_json(db, &mut batch, CF_USERS, &id.to_be_bytes(), user)?;
        }
        for (email, id) in &staged.emails {
            batch.put_cf(cf(db, CF_USER_EMAILS)?, email.as_bytes(), id.to_be_bytes());
        }
        for (id, wallet) in &staged.wallets {
            put_json(db, &mut batch, CF_WALLETS, &id.to_be_bytes(), wallet)?;
        }
        for (user_id, wallet_id) in &staged.wallet_by_user {
            batch.put_cf(
                cf(db, CF_USER_WALLETS)?,
                user_id.to_be_bytes(),
                wallet_id.to_be_bytes(),
            );
        }
        for tx in &staged.transactions {
            put_json(db, &mut batch, CF_TRANSACTIONS, &tx.id.to_be_bytes(), tx)?;
        }
        put_json(db, &mut batch, CF_META, SEQUENCES_KEY, &staged.sequences)?;

        db.write(batch)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::GENESIS;
    use crate::domain::transaction::{TransactionStatus, TransactionType};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn profile(email: &str) -> NewUser {
        NewUser {
            full_name: "Alice".to_string(),
            email: Some(email.to_string()),
            password: Some("pw".to_string()),
        }
    }

    fn payment(previous_hash: &str, hash: &str) -> NewTransaction {
        NewTransaction {
            wallet_id: 1,
            amount: dec!(-10),
            r#type: TransactionType::Payment,
            status: TransactionStatus::Success,
            previous_hash: previous_hash.to_string(),
            hash: hash.to_string(),
            hand_token: "hand".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in COLUMN_FAMILIES {
            assert!(store.db.cf_handle(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_rocksdb_commit_and_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            let mut txn = store.begin().await.unwrap();
            let user = txn.create_user(profile("a@x.io")).await.unwrap();
            txn.create_wallet(user.id, "EUR", dec!(500.00)).await.unwrap();
            txn.append_transaction(payment(GENESIS, "h1")).await.unwrap();
            txn.commit().await.unwrap();
            store.close().await.unwrap();
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        let mut txn = store.begin().await.unwrap();
        let user = txn.find_user_by_credentials("a@x.io", "pw").await.unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(
            txn.find_wallet_by_user(user.id).await.unwrap().balance,
            dec!(500.00)
        );
        assert_eq!(txn.last_transaction().await.unwrap().unwrap().hash, "h1");

        // Sequences survive a restart.
        let second = txn.append_transaction(payment("h1", "h2")).await.unwrap();
        assert_eq!(second.id, 2);
        let next_user = txn.create_user(profile("b@x.io")).await.unwrap();
        assert_eq!(next_user.id, 2);
    }

    #[tokio::test]
    async fn test_rocksdb_rollback_discards_writes() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut txn = store.begin().await.unwrap();
        txn.create_user(profile("a@x.io")).await.unwrap();
        txn.append_transaction(payment(GENESIS, "h1")).await.unwrap();
        txn.rollback().await.unwrap();

        let mut txn = store.begin().await.unwrap();
        assert!(txn.find_user(1).await.is_err());
        assert!(txn.last_transaction().await.unwrap().is_none());
        assert!(txn.transactions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rocksdb_duplicate_email() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut txn = store.begin().await.unwrap();
        txn.create_user(profile("a@x.io")).await.unwrap();
        txn.commit().await.unwrap();

        let mut txn = store.begin().await.unwrap();
        assert!(matches!(
            txn.create_user(profile("a@x.io")).await,
            Err(PaymentError::DuplicateKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_rocksdb_transactions_in_creation_order() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut previous = GENESIS.to_string();
        for i in 0..300 {
            let mut txn = store.begin().await.unwrap();
            let hash = format!("h{i}");
            txn.append_transaction(payment(&previous, &hash)).await.unwrap();
            txn.commit().await.unwrap();
            previous = hash;
        }

        let mut txn = store.begin().await.unwrap();
        let all = txn.transactions().await.unwrap();
        assert_eq!(all.len(), 300);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(txn.last_transaction().await.unwrap().unwrap().hash, "h299");
    }
}
