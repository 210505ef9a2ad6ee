//! Ledger domain: entities, chain hashing and the storage port.

pub mod chain;
pub mod ports;
pub mod transaction;
pub mod user;
pub mod wallet;
