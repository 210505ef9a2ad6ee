use crate::domain::transaction::Transaction;
use crate::error::Result;
use std::io::Write;

/// Writes ledger entries as CSV, one row per chained transaction.
///
/// The header row is emitted automatically from the `Transaction` field names.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    /// Creates a new `LedgerWriter` over any `Write` sink (e.g., File, Stdout).
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes every entry in the given order and flushes the sink.
    pub fn write_ledger<'a, I>(&mut self, transactions: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        for tx in transactions {
            self.writer.serialize(tx)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::{GENESIS, chain_hash};
    use crate::domain::transaction::{NewTransaction, TransactionStatus, TransactionType};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_writer_emits_header_and_rows() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let tx = NewTransaction {
            wallet_id: 1,
            amount: dec!(-120.00),
            r#type: TransactionType::Payment,
            status: TransactionStatus::Success,
            previous_hash: GENESIS.to_string(),
            hash: chain_hash(1, dec!(-120.00), GENESIS, "hand-1", created_at),
            hand_token: "hand-1".to_string(),
            created_at,
        }
        .into_transaction(1);

        let mut out = Vec::new();
        LedgerWriter::new(&mut out).write_ledger([&tx]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "id,wallet_id,amount,type,status,previous_hash,hash,hand_token,created_at"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,1,-120.00,PAYMENT,SUCCESS,GENESIS,"));
        assert!(row.contains(&tx.hash));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_writer_empty_ledger() {
        let mut out = Vec::new();
        LedgerWriter::new(&mut out).write_ledger(&[]).unwrap();
        assert!(out.is_empty());
    }
}
