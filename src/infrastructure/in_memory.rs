use crate::domain::ports::{
    Page, PinAttemptStore, TransactionFilter, TransactionStore, UserStore, WalletStore,
};
use crate::domain::transaction::Transaction;
use crate::domain::user::{PinAttemptRecord, User};
use crate::domain::wallet::Wallet;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Thread-safe in-memory user store. Suited to tests and the CLI driver;
/// persistence goes through the RocksDB adapter.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn store(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryWalletStore {
    wallets: Arc<RwLock<HashMap<Uuid, Wallet>>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn store(&self, wallet: Wallet) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        wallets.insert(wallet.user_id, wallet);
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.get(&user_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.values().cloned().collect())
    }
}

/// In-memory transaction store keyed by reference, which is where the
/// global uniqueness of references is enforced.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&tx.reference) {
            return Err(WalletError::DuplicateReference(tx.reference));
        }
        transactions.insert(tx.reference.clone(), tx);
        Ok(())
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        if !transactions.contains_key(&tx.reference) {
            return Err(WalletError::TransactionNotFound(tx.reference));
        }
        transactions.insert(tx.reference.clone(), tx);
        Ok(())
    }

    async fn get(&self, reference: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(reference).cloned())
    }

    async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: Page,
    ) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        let mut matching: Vec<Transaction> = transactions
            .values()
            .filter(|tx| tx.user_id == user_id && filter.matches(tx))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }
}

/// PIN attempt counters. The increment-and-check runs under one write
/// lock, so two concurrent failures cannot both observe the same count.
#[derive(Default, Clone)]
pub struct InMemoryPinAttemptStore {
    attempts: Arc<RwLock<HashMap<Uuid, PinAttemptRecord>>>,
}

impl InMemoryPinAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PinAttemptStore for InMemoryPinAttemptStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<PinAttemptRecord>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(&user_id).cloned())
    }

    async fn record_failure(
        &self,
        user_id: Uuid,
        max_attempts: u8,
        lock_duration: Duration,
    ) -> Result<PinAttemptRecord> {
        let mut attempts = self.attempts.write().await;
        let now = Utc::now();
        let record = attempts
            .entry(user_id)
            .and_modify(|record| {
                record.attempts += 1;
                record.last_attempt = now;
            })
            .or_insert_with(|| PinAttemptRecord::first_failure(now));
        if record.attempts >= max_attempts && record.locked_until.is_none() {
            record.locked_until = Some(now + lock_duration);
        }
        Ok(record.clone())
    }

    async fn clear(&self, user_id: Uuid) -> Result<()> {
        let mut attempts = self.attempts.write().await;
        attempts.remove(&user_id);
        Ok(())
    }
}
