use super::user::UserId;
use crate::error::PaymentError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type WalletId = u64;

/// Decimal places a ledger amount may carry.
pub const MONEY_SCALE: u32 = 2;

/// True when `value` has no digits below the smallest currency unit.
pub fn is_whole_cents(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

/// A strictly positive monetary amount, in whole cents, for payments and credits.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO && is_whole_cents(value) {
            Ok(Self(value))
        } else {
            Err(PaymentError::InvalidAmount(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A user's cash holding. The balance is never negative in a committed state.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub currency: String,
    pub balance: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl Wallet {
    pub fn new(
        id: WalletId,
        user_id: UserId,
        currency: impl Into<String>,
        balance: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            currency: currency.into(),
            balance,
            last_updated: now,
        }
    }

    /// Removes funds if the balance covers them; the wallet is untouched otherwise.
    pub fn debit(&mut self, amount: Amount, now: DateTime<Utc>) -> Result<(), PaymentError> {
        if self.balance < amount.value() {
            return Err(PaymentError::InsufficientFunds {
                wallet: self.id,
                available: self.balance,
                requested: amount.value(),
            });
        }
        self.balance -= amount.value();
        self.last_updated = now;
        Ok(())
    }

    pub fn credit(&mut self, amount: Amount, now: DateTime<Utc>) -> Result<(), PaymentError> {
        self.balance = self
            .balance
            .checked_add(amount.value())
            .ok_or_else(|| {
                PaymentError::InvalidInput(format!(
                    "credit of {} overflows wallet {}",
                    amount.value(),
                    self.id
                ))
            })?;
        self.last_updated = now;
        Ok(())
    }
}
