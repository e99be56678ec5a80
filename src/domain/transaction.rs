use crate::domain::money::{Amount, Balance};
use crate::error::WalletError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

pub const MAX_BETTING_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
    TransferIn,
    TransferOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    Funding,
    Withdrawal,
    Transfer,
    Payment,
    Refund,
    Fee,
    Bonus,
    Betting,
}

/// Generates a globally unique transaction reference.
pub fn new_reference() -> String {
    format!("txn_{}", Uuid::new_v4().simple())
}

/// Immutable audit record of one ledger event. Amount and the captured
/// balances never change after creation; only the status advances, plus
/// metadata annotation on the bounded betting retry path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub reference: String,
    pub wallet_id: Uuid,
    pub user_id: Uuid,
    pub r#type: TransactionType,
    pub amount: Decimal,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    pub status: TransactionStatus,
    pub category: TransactionCategory,
    pub description: String,
    /// The opposite leg of a transfer.
    pub related_reference: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// A record that is already settled, used by the synchronous
    /// credit/debit/transfer paths where balance mutation and the record
    /// are written together.
    #[allow(clippy::too_many_arguments)]
    pub fn completed(
        reference: String,
        wallet_id: Uuid,
        user_id: Uuid,
        r#type: TransactionType,
        amount: Amount,
        previous: Balance,
        new: Balance,
        category: TransactionCategory,
        description: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            reference,
            wallet_id,
            user_id,
            r#type,
            amount: amount.value(),
            previous_balance: previous.value(),
            new_balance: new.value(),
            status: TransactionStatus::Completed,
            category,
            description,
            related_reference: None,
            metadata: json!({}),
            created_at: now,
            completed_at: Some(now),
        }
    }

    /// A record awaiting an external outcome. Both captured balances equal
    /// the balance at creation until `complete` applies the mutation.
    pub fn pending(
        reference: String,
        wallet_id: Uuid,
        user_id: Uuid,
        r#type: TransactionType,
        amount: Amount,
        balance: Balance,
        category: TransactionCategory,
        description: String,
        metadata: Value,
    ) -> Self {
        Self {
            reference,
            wallet_id,
            user_id,
            r#type,
            amount: amount.value(),
            previous_balance: balance.value(),
            new_balance: balance.value(),
            status: TransactionStatus::Pending,
            category,
            description,
            related_reference: None,
            metadata,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn ensure_open(&self) -> Result<(), WalletError> {
        if self.status.is_terminal() {
            return Err(WalletError::Validation(format!(
                "transaction {} is already settled",
                self.reference
            )));
        }
        Ok(())
    }

    /// Settles a pending record, capturing the balances at the instant the
    /// mutation was applied.
    pub fn complete(&mut self, previous: Balance, new: Balance) -> Result<(), WalletError> {
        self.ensure_open()?;
        self.previous_balance = previous.value();
        self.new_balance = new.value();
        self.status = TransactionStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, reason: &str) -> Result<(), WalletError> {
        self.ensure_open()?;
        self.status = TransactionStatus::Failed;
        self.annotate("failure_reason", json!(reason));
        Ok(())
    }

    pub fn cancel(&mut self, reason: &str) -> Result<(), WalletError> {
        if self.status == TransactionStatus::Cancelled {
            return Ok(());
        }
        self.status = TransactionStatus::Cancelled;
        self.annotate("cancel_reason", json!(reason));
        Ok(())
    }

    /// Inserts or replaces one metadata key.
    pub fn annotate(&mut self, key: &str, value: Value) {
        if let Value::Object(map) = &mut self.metadata {
            map.insert(key.to_string(), value);
        } else {
            self.metadata = json!({ key: value });
        }
    }

    pub fn betting_retry_count(&self) -> u32 {
        self.metadata
            .pointer("/betting/retry_count")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32
    }

    /// Whether the bounded betting retry transition applies.
    pub fn can_retry(&self) -> bool {
        self.status == TransactionStatus::Failed
            && self.category == TransactionCategory::Betting
            && self.betting_retry_count() < MAX_BETTING_RETRIES
    }

    /// Moves a failed betting record back to pending, consuming one retry.
    pub fn mark_retry(&mut self) -> Result<u32, WalletError> {
        if !self.can_retry() {
            return Err(WalletError::RetryExhausted(self.reference.clone()));
        }
        let next = self.betting_retry_count() + 1;
        if let Some(betting) = self.metadata.pointer_mut("/betting") {
            betting["retry_count"] = json!(next);
        } else {
            self.annotate("betting", json!({ "retry_count": next }));
        }
        self.status = TransactionStatus::Pending;
        Ok(next)
    }
}
