use crate::domain::ports::{
    Page, PinAttemptStore, TransactionFilter, TransactionStore, UserStore, WalletStore,
};
use crate::domain::transaction::Transaction;
use crate::domain::user::{PinAttemptRecord, User};
use crate::domain::wallet::Wallet;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

pub const CF_USERS: &str = "users";
pub const CF_WALLETS: &str = "wallets";
pub const CF_TRANSACTIONS: &str = "transactions";
pub const CF_PIN_ATTEMPTS: &str = "pin_attempts";

/// Persistent store backing all four ports with one RocksDB instance,
/// one column family per entity. PIN attempt state is deliberately kept
/// here too, so lockouts survive restarts alongside the wallets they
/// protect.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens or creates the database, ensuring all column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_USERS, CF_WALLETS, CF_TRANSACTIONS, CF_PIN_ATTEMPTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| WalletError::Storage(format!("column family {name} not found")))
    }

    fn put_json<T: serde::Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key, bytes)?;
        Ok(())
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn store(&self, user: User) -> Result<()> {
        self.put_json(CF_USERS, user.id.as_bytes(), &user)
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<User>> {
        self.get_json(CF_USERS, user_id.as_bytes())
    }
}

#[async_trait]
impl WalletStore for RocksDbStore {
    async fn store(&self, wallet: Wallet) -> Result<()> {
        self.put_json(CF_WALLETS, wallet.user_id.as_bytes(), &wallet)
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<Wallet>> {
        self.get_json(CF_WALLETS, user_id.as_bytes())
    }

    async fn get_all(&self) -> Result<Vec<Wallet>> {
        let cf = self.cf(CF_WALLETS)?;
        let mut wallets = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| WalletError::Storage(format!("iteration error: {e}")))?;
            wallets.push(serde_json::from_slice(&value)?);
        }
        Ok(wallets)
    }
}

#[async_trait]
impl TransactionStore for RocksDbStore {
    async fn insert(&self, tx: Transaction) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        // Existence check without copying the value out.
        if self.db.get_pinned_cf(cf, tx.reference.as_bytes())?.is_some() {
            return Err(WalletError::DuplicateReference(tx.reference));
        }
        self.put_json(CF_TRANSACTIONS, tx.reference.as_bytes(), &tx)
    }

    async fn update(&self, tx: Transaction) -> Result<()> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        if self.db.get_pinned_cf(cf, tx.reference.as_bytes())?.is_none() {
            return Err(WalletError::TransactionNotFound(tx.reference));
        }
        self.put_json(CF_TRANSACTIONS, tx.reference.as_bytes(), &tx)
    }

    async fn get(&self, reference: &str) -> Result<Option<Transaction>> {
        self.get_json(CF_TRANSACTIONS, reference.as_bytes())
    }

    async fn list(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: Page,
    ) -> Result<Vec<Transaction>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut matching = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| WalletError::Storage(format!("iteration error: {e}")))?;
            let tx: Transaction = serde_json::from_slice(&value)?;
            if tx.user_id == user_id && filter.matches(&tx) {
                matching.push(tx);
            }
        }
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }
}

#[async_trait]
impl PinAttemptStore for RocksDbStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<PinAttemptRecord>> {
        self.get_json(CF_PIN_ATTEMPTS, user_id.as_bytes())
    }

    async fn record_failure(
        &self,
        user_id: Uuid,
        max_attempts: u8,
        lock_duration: Duration,
    ) -> Result<PinAttemptRecord> {
        let now = Utc::now();
        let mut record: PinAttemptRecord = self
            .get_json(CF_PIN_ATTEMPTS, user_id.as_bytes())?
            .map(|mut record: PinAttemptRecord| {
                record.attempts += 1;
                record.last_attempt = now;
                record
            })
            .unwrap_or_else(|| PinAttemptRecord::first_failure(now));
        if record.attempts >= max_attempts && record.locked_until.is_none() {
            record.locked_until = Some(now + lock_duration);
        }
        self.put_json(CF_PIN_ATTEMPTS, user_id.as_bytes(), &record)?;
        Ok(record)
    }

    async fn clear(&self, user_id: Uuid) -> Result<()> {
        self.db
            .delete_cf(self.cf(CF_PIN_ATTEMPTS)?, user_id.as_bytes())?;
        Ok(())
    }
}
