use crate::domain::wallet::{Wallet, WalletStatus};
use crate::error::Result;
use std::io::Write;

/// Writes the final wallet statement as CSV, one row per wallet, sorted by
/// user id for stable output.
pub struct StatementWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> StatementWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_statement(&mut self, mut wallets: Vec<Wallet>) -> Result<()> {
        wallets.sort_by_key(|w| w.user_id);

        self.writer.write_record([
            "user_id",
            "balance",
            "currency",
            "total_credited",
            "total_debited",
            "transactions",
            "frozen",
        ])?;
        for wallet in wallets {
            self.writer.write_record([
                wallet.user_id.to_string(),
                wallet.balance.value().to_string(),
                wallet.currency.clone(),
                wallet.stats.total_credited.to_string(),
                wallet.stats.total_debited.to_string(),
                wallet.stats.transaction_count.to_string(),
                (wallet.status == WalletStatus::Frozen).to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Amount;
    use crate::domain::user::KycLevel;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_statement_rows() {
        let mut wallet = Wallet::new(Uuid::new_v4(), KycLevel::new(3));
        wallet.credit(Amount::new(dec!(1500.0)).unwrap());
        wallet
            .debit(
                Amount::new(dec!(500.0)).unwrap(),
                chrono::Utc::now().date_naive(),
            )
            .unwrap();

        let mut buffer = Vec::new();
        StatementWriter::new(&mut buffer)
            .write_statement(vec![wallet.clone()])
            .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with(
            "user_id,balance,currency,total_credited,total_debited,transactions,frozen"
        ));
        assert!(output.contains(&format!("{},1000.0,NGN,1500.0,500.0,2,false", wallet.user_id)));
    }
}
