//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `PaymentEngine`, the single entry point for
//! registration, hand enrolment, payments and ledger audits. It owns an
//! injected ledger store and clock, and runs every mutation inside one
//! atomic store scope.

pub mod config;
pub mod engine;

pub use config::EngineConfig;
pub use engine::PaymentEngine;
