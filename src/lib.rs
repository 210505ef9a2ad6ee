//! HandPay ledger core.
//!
//! Users register, link a biometric hand token and spend a wallet balance.
//! Every payment debits the wallet and appends a hash-chained ledger entry in
//! one atomic store scope.
//!
//! - [`domain`] - entities, chain hashing, the [`domain::ports::LedgerStore`] port
//! - [`application`] - the [`application::PaymentEngine`]
//! - [`infrastructure`] - in-memory and RocksDB stores
//! - [`interfaces`] - HTTP API and CSV ledger export

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
