use crate::domain::product::PurchaseRequest;
use crate::domain::transaction::{Transaction, TransactionCategory, TransactionStatus, TransactionType};
use crate::domain::user::{PinAttemptRecord, User};
use crate::domain::wallet::Wallet;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn store(&self, user: User) -> Result<()>;
    async fn get(&self, user_id: Uuid) -> Result<Option<User>>;
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn store(&self, wallet: Wallet) -> Result<()>;
    async fn get(&self, user_id: Uuid) -> Result<Option<Wallet>>;
    async fn get_all(&self) -> Result<Vec<Wallet>>;
}

/// Filter applied to transaction listings.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub r#type: Option<TransactionType>,
    pub status: Option<TransactionStatus>,
    pub category: Option<TransactionCategory>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.r#type.is_none_or(|t| tx.r#type == t)
            && self.status.is_none_or(|s| tx.status == s)
            && self.category.is_none_or(|c| tx.category == c)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Appends a new record. Fails with `DuplicateReference` when the
    /// reference is already present; callers regenerate and retry.
    async fn insert(&self, tx: Transaction) -> Result<()>;
    /// Persists a status/metadata advance of an existing record.
    async fn update(&self, tx: Transaction) -> Result<()>;
    async fn get(&self, reference: &str) -> Result<Option<Transaction>>;
    /// Records for one user, newest first, filtered and paginated.
    async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: Page,
    ) -> Result<Vec<Transaction>>;
}

#[async_trait]
pub trait PinAttemptStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<PinAttemptRecord>>;
    /// Atomically increments the failure count, engaging the lock once
    /// `max_attempts` is reached. Returns the updated record.
    async fn record_failure(
        &self,
        user_id: Uuid,
        max_attempts: u8,
        lock_duration: Duration,
    ) -> Result<PinAttemptRecord>;
    async fn clear(&self, user_id: Uuid) -> Result<()>;
}

/// Uniform result of one Service Processor call. `success == false` is a
/// normal declined outcome, not a fault; the reference is always present so
/// the caller has something to show.
#[derive(Debug, Clone)]
pub struct ProcessorOutcome {
    pub success: bool,
    pub reference: String,
    pub description: String,
    pub message: String,
    pub data: Value,
}

impl ProcessorOutcome {
    pub fn approved(reference: &str, description: &str, message: &str, data: Value) -> Self {
        Self {
            success: true,
            reference: reference.to_string(),
            description: description.to_string(),
            message: message.to_string(),
            data,
        }
    }

    pub fn declined(reference: &str, description: &str, message: &str) -> Self {
        Self {
            success: false,
            reference: reference.to_string(),
            description: description.to_string(),
            message: message.to_string(),
            data: Value::Null,
        }
    }
}

/// One implementation per product type. Validates product-specific fields
/// and performs the provider call; field validation failures come back as
/// declined outcomes, never as errors.
#[async_trait]
pub trait ServiceProcessor: Send + Sync {
    fn product(&self) -> crate::domain::product::ProductType;
    async fn process(&self, request: &PurchaseRequest, reference: &str) -> ProcessorOutcome;
}

pub type UserStoreRef = Arc<dyn UserStore>;
pub type WalletStoreRef = Arc<dyn WalletStore>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type PinAttemptStoreRef = Arc<dyn PinAttemptStore>;
