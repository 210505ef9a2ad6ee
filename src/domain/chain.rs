//! Hash chaining of ledger entries.
//!
//! Every [`Transaction`] carries the hash of the entry committed before it,
//! forming one global chain across all wallets. Altering any stored entry
//! invalidates its own hash and every link after it.

use super::transaction::Transaction;
use super::wallet::{WalletId, is_whole_cents};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Debug;

/// `previous_hash` of the first entry in the chain.
pub const GENESIS: &str = "GENESIS";

/// Source of wall-clock time for ledger timestamps and chain hashes.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant. Makes chain hashes reproducible in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// SHA-256 over the entry's wallet, signed amount (two decimals), predecessor
/// hash, hand token and creation time in Unix nanoseconds. Hex encoded.
pub fn chain_hash(
    wallet_id: WalletId,
    amount: Decimal,
    previous_hash: &str,
    hand_token: &str,
    created_at: DateTime<Utc>,
) -> String {
    let nanos = i128::from(created_at.timestamp()) * 1_000_000_000
        + i128::from(created_at.timestamp_subsec_nanos());
    let record = format!("{wallet_id}{amount:.2}{previous_hash}{hand_token}{nanos}");

    let mut hasher = Sha256::new();
    hasher.update(record.as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of a successful chain walk.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct ChainReport {
    pub length: usize,
    /// Hash of the newest entry, `GENESIS` for an empty ledger.
    pub head: String,
}

/// Walks `transactions` in creation order and checks every link and hash.
pub fn verify_chain(transactions: &[Transaction]) -> Result<ChainReport> {
    let mut expected_previous = GENESIS;

    for tx in transactions {
        if tx.previous_hash != expected_previous {
            return Err(PaymentError::ChainBroken {
                transaction_id: tx.id,
                reason: format!(
                    "previous_hash {} does not match {}",
                    tx.previous_hash, expected_previous
                ),
            });
        }

        // The hash only covers two decimal places, so finer digits are unverifiable.
        if !is_whole_cents(tx.amount) {
            return Err(PaymentError::ChainBroken {
                transaction_id: tx.id,
                reason: format!("amount {} has sub-cent digits", tx.amount),
            });
        }

        let recomputed = chain_hash(
            tx.wallet_id,
            tx.amount,
            &tx.previous_hash,
            &tx.hand_token,
            tx.created_at,
        );
        if recomputed != tx.hash {
            return Err(PaymentError::ChainBroken {
                transaction_id: tx.id,
                reason: "stored hash does not match record contents".to_string(),
            });
        }

        expected_previous = &tx.hash;
    }

    Ok(ChainReport {
        length: transactions.len(),
        head: expected_previous.to_string(),
    })
}
