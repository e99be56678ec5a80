use crate::application::ledger::WalletLedger;
use crate::domain::money::Amount;
use crate::domain::ports::{
    ProcessorOutcome, ServiceProcessor, TransactionStore, TransactionStoreRef,
};
use crate::domain::product::{ProductType, PurchaseReceipt, PurchaseRequest};
use crate::error::{Result, WalletError};
use crate::processors::ProcessorRegistry;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Bounded re-execution of failed betting purchases.
///
/// A betting transaction that failed keeps its stake reserved state in the
/// ledger record; each retry moves it back to pending, replays the
/// processor with the original provider/customer/amount, and settles the
/// debit only on the attempt that finally succeeds. The cap is enforced
/// before any provider call.
pub struct BettingRetryManager {
    ledger: Arc<WalletLedger>,
    transactions: TransactionStoreRef,
    registry: Arc<ProcessorRegistry>,
    provider_timeout: Duration,
}

impl BettingRetryManager {
    pub fn new(
        ledger: Arc<WalletLedger>,
        transactions: TransactionStoreRef,
        registry: Arc<ProcessorRegistry>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            transactions,
            registry,
            provider_timeout,
        }
    }

    pub async fn can_retry(&self, reference: &str) -> Result<bool> {
        let tx = self
            .transactions
            .get(reference)
            .await?
            .ok_or_else(|| WalletError::TransactionNotFound(reference.to_string()))?;
        Ok(tx.can_retry())
    }

    pub async fn retry(&self, reference: &str) -> Result<PurchaseReceipt> {
        let mut tx = self
            .transactions
            .get(reference)
            .await?
            .ok_or_else(|| WalletError::TransactionNotFound(reference.to_string()))?;

        // Rejected before the processor is touched.
        let attempt = tx.mark_retry()?;
        self.transactions.update(tx.clone()).await?;
        tracing::info!(reference, attempt, "retrying betting purchase");

        let request = retry_request(&tx.metadata, tx.amount)?;
        let processor = self
            .registry
            .get(ProductType::Betting)
            .ok_or_else(|| WalletError::UnknownProduct(ProductType::Betting.to_string()))?;

        let outcome = match tokio::time::timeout(
            self.provider_timeout,
            processor.process(&request, reference),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                ProcessorOutcome::declined(reference, &tx.description, "provider timed out")
            }
        };

        if outcome.success {
            let (wallet, settled) = self
                .ledger
                .commit_debit(reference, Some(outcome.data))
                .await?;
            tracing::info!(reference, attempt, "betting retry settled");
            Ok(PurchaseReceipt {
                success: true,
                message: outcome.message,
                transaction: settled,
                new_balance: Some(wallet.balance.value()),
            })
        } else {
            let failed = self.ledger.fail_debit(reference, &outcome.message).await?;
            tracing::info!(reference, attempt, reason = %outcome.message, "betting retry declined");
            Ok(PurchaseReceipt {
                success: false,
                message: outcome.message,
                transaction: failed,
                new_balance: None,
            })
        }
    }
}

/// Rebuilds the processor input from the stored betting metadata. The PIN
/// was verified on the original attempt and is not re-collected.
fn retry_request(metadata: &Value, amount: rust_decimal::Decimal) -> Result<PurchaseRequest> {
    Amount::new(amount)?;
    let mut fields = Map::new();
    for key in ["provider", "customer_id"] {
        let value = metadata
            .pointer(&format!("/betting/{key}"))
            .cloned()
            .unwrap_or(Value::Null);
        fields.insert(key.to_string(), value);
    }
    Ok(PurchaseRequest {
        product: ProductType::Betting,
        amount,
        pin: String::new(),
        fields,
    })
}

/// Convenience lookup used by callers that only hold a user id.
pub async fn latest_failed_betting_reference(
    transactions: &TransactionStoreRef,
    user_id: Uuid,
) -> Result<Option<String>> {
    use crate::domain::ports::{Page, TransactionFilter};
    use crate::domain::transaction::{TransactionCategory, TransactionStatus};

    let filter = TransactionFilter {
        status: Some(TransactionStatus::Failed),
        category: Some(TransactionCategory::Betting),
        ..Default::default()
    };
    let mut failed = transactions
        .list(user_id, &filter, Page { limit: 1, offset: 0 })
        .await?;
    Ok(failed.pop().map(|tx| tx.reference))
}
