use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Deployment policy applied to newly registered wallets.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// ISO currency code for every wallet.
    pub currency: String,
    /// Balance credited to a wallet when its user registers.
    pub opening_balance: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
            opening_balance: dec!(500.00),
        }
    }
}
