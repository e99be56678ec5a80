use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{
    Page, TransactionFilter, TransactionStore, TransactionStoreRef, WalletStore, WalletStoreRef,
};
use crate::domain::transaction::{
    Transaction, TransactionCategory, TransactionStatus, TransactionType, new_reference,
};
use crate::domain::user::User;
use crate::domain::wallet::Wallet;
use crate::error::{Result, WalletError};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// The single component allowed to mutate wallet balances.
///
/// Every mutation runs under a per-wallet async mutex, so concurrent
/// requests against the same wallet are serialized and a lost update or a
/// negative balance cannot occur. The transaction record and the balance
/// move together: the record is inserted first (enforcing reference
/// uniqueness), and a store failure on either side is compensated before
/// the operation returns.
pub struct WalletLedger {
    wallets: WalletStoreRef,
    transactions: TransactionStoreRef,
    guards: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl WalletLedger {
    pub fn new(wallets: WalletStoreRef, transactions: TransactionStoreRef) -> Self {
        Self {
            wallets,
            transactions,
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// The write guard for one wallet, keyed by owner id.
    async fn guard(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().await;
        guards
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load_wallet(&self, user_id: Uuid) -> Result<Wallet> {
        self.wallets
            .get(user_id)
            .await?
            .ok_or(WalletError::WalletNotFound(user_id))
    }

    async fn load_active_wallet(&self, user_id: Uuid) -> Result<Wallet> {
        let wallet = self.load_wallet(user_id).await?;
        if !wallet.is_active() {
            return Err(WalletError::WalletInactive);
        }
        Ok(wallet)
    }

    /// Creates the 1:1 wallet for a newly registered user.
    pub async fn open_wallet(&self, user: &User) -> Result<Wallet> {
        if self.wallets.get(user.id).await?.is_some() {
            return Err(WalletError::Validation(format!(
                "user {} already has a wallet",
                user.id
            )));
        }
        let wallet = Wallet::new(user.id, user.kyc_level);
        self.wallets.store(wallet.clone()).await?;
        tracing::info!(user_id = %user.id, wallet_id = %wallet.id, "wallet opened");
        Ok(wallet)
    }

    pub async fn wallet(&self, user_id: Uuid) -> Result<Wallet> {
        self.load_wallet(user_id).await
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<Balance> {
        Ok(self.load_wallet(user_id).await?.balance)
    }

    pub async fn transactions(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
        page: Page,
    ) -> Result<Vec<Transaction>> {
        self.transactions.list(user_id, filter, page).await
    }

    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: Amount,
        description: &str,
        reference: Option<String>,
    ) -> Result<(Wallet, Transaction)> {
        let guard = self.guard(user_id).await;
        let _held = guard.lock().await;
        self.credit_locked(
            user_id,
            amount,
            description,
            reference,
            TransactionType::Credit,
            TransactionCategory::Funding,
            None,
        )
        .await
    }

    pub async fn debit(
        &self,
        user_id: Uuid,
        amount: Amount,
        description: &str,
        reference: Option<String>,
    ) -> Result<(Wallet, Transaction)> {
        let guard = self.guard(user_id).await;
        let _held = guard.lock().await;
        self.debit_locked(
            user_id,
            amount,
            description,
            reference,
            TransactionType::Debit,
            TransactionCategory::Withdrawal,
            None,
        )
        .await
    }

    /// Moves funds between two wallets under one shared reference. The
    /// destination is validated before the debit leg; if the credit leg
    /// still fails afterwards, the source debit is reversed.
    pub async fn transfer(
        &self,
        source: Uuid,
        dest: Uuid,
        amount: Amount,
        description: &str,
    ) -> Result<String> {
        if source == dest {
            return Err(WalletError::Validation(
                "cannot transfer to the same wallet".to_string(),
            ));
        }

        // Lock both wallets in canonical order so two opposing transfers
        // cannot deadlock.
        let (first, second) = if source < dest {
            (source, dest)
        } else {
            (dest, source)
        };
        let first_guard = self.guard(first).await;
        let second_guard = self.guard(second).await;
        let _first_held = first_guard.lock().await;
        let _second_held = second_guard.lock().await;

        let source_wallet = self.load_active_wallet(source).await?;
        self.load_active_wallet(dest).await?;
        if !source_wallet.balance.covers(amount) {
            return Err(WalletError::InsufficientBalance {
                available: source_wallet.balance.value(),
                required: amount.value(),
            });
        }

        let base = new_reference();
        let in_reference = format!("{base}-in");

        self.debit_locked(
            source,
            amount,
            description,
            Some(base.clone()),
            TransactionType::TransferOut,
            TransactionCategory::Transfer,
            Some(in_reference.clone()),
        )
        .await?;

        let credit_leg = self
            .credit_locked(
                dest,
                amount,
                description,
                Some(in_reference),
                TransactionType::TransferIn,
                TransactionCategory::Transfer,
                Some(base.clone()),
            )
            .await;

        match credit_leg {
            Ok(_) => {
                tracing::info!(reference = %base, %amount, "transfer settled");
                Ok(base)
            }
            Err(cause) => {
                tracing::warn!(reference = %base, error = %cause, "credit leg failed, reversing debit");
                let reversal = self
                    .credit_locked(
                        source,
                        amount,
                        "Transfer reversal",
                        None,
                        TransactionType::Credit,
                        TransactionCategory::Refund,
                        Some(base.clone()),
                    )
                    .await;
                if let Err(reversal_err) = reversal {
                    // The source has been debited with no matching credit
                    // anywhere. Manual reconciliation required.
                    tracing::error!(
                        reference = %base,
                        error = %reversal_err,
                        "transfer compensation failed, reconciliation required"
                    );
                }
                Err(WalletError::TransferFailed(cause.to_string()))
            }
        }
    }

    pub async fn freeze(&self, user_id: Uuid) -> Result<Wallet> {
        self.set_status(user_id, crate::domain::wallet::WalletStatus::Frozen)
            .await
    }

    pub async fn unfreeze(&self, user_id: Uuid) -> Result<Wallet> {
        self.set_status(user_id, crate::domain::wallet::WalletStatus::Active)
            .await
    }

    async fn set_status(
        &self,
        user_id: Uuid,
        status: crate::domain::wallet::WalletStatus,
    ) -> Result<Wallet> {
        let guard = self.guard(user_id).await;
        let _held = guard.lock().await;
        let mut wallet = self.load_wallet(user_id).await?;
        wallet.status = status;
        self.wallets.store(wallet.clone()).await?;
        tracing::info!(user_id = %user_id, ?status, "wallet status changed");
        Ok(wallet)
    }

    /// Appends a `pending` debit without touching the balance. Used by the
    /// purchase flow to reserve a reference and validate funds before the
    /// provider call.
    pub async fn begin_debit(
        &self,
        user_id: Uuid,
        amount: Amount,
        description: &str,
        category: TransactionCategory,
        metadata: Value,
    ) -> Result<Transaction> {
        let guard = self.guard(user_id).await;
        let _held = guard.lock().await;

        let wallet = self.load_active_wallet(user_id).await?;
        if !wallet.balance.covers(amount) {
            return Err(WalletError::InsufficientBalance {
                available: wallet.balance.value(),
                required: amount.value(),
            });
        }
        let today = Utc::now().date_naive();
        if let Some(headroom) = wallet.daily_headroom(today)
            && headroom < amount.value()
        {
            return Err(WalletError::LimitExceeded(format!(
                "daily headroom {} is below the requested amount",
                headroom
            )));
        }

        let tx = Transaction::pending(
            new_reference(),
            wallet.id,
            user_id,
            TransactionType::Debit,
            amount,
            wallet.balance,
            category,
            description.to_string(),
            metadata,
        );
        self.transactions.insert(tx.clone()).await?;
        Ok(tx)
    }

    /// Settles a pending debit: applies the balance mutation and completes
    /// the record as one unit under the wallet guard. `provider_data` is
    /// annotated onto the record before settlement.
    pub async fn commit_debit(
        &self,
        reference: &str,
        provider_data: Option<Value>,
    ) -> Result<(Wallet, Transaction)> {
        let stale = self
            .transactions
            .get(reference)
            .await?
            .ok_or_else(|| WalletError::TransactionNotFound(reference.to_string()))?;

        let guard = self.guard(stale.user_id).await;
        let _held = guard.lock().await;

        // Re-read under the guard; another settlement may have won.
        let mut tx = self
            .transactions
            .get(reference)
            .await?
            .ok_or_else(|| WalletError::TransactionNotFound(reference.to_string()))?;
        if tx.status != TransactionStatus::Pending {
            return Err(WalletError::Validation(format!(
                "transaction {} is not pending",
                reference
            )));
        }

        let snapshot = self.load_active_wallet(tx.user_id).await?;
        let mut wallet = snapshot.clone();
        let amount = Amount::new(tx.amount)?;
        let applied = wallet.debit(amount, Utc::now().date_naive());
        let (previous, new) = match applied {
            Ok(pair) => pair,
            Err(err) => {
                // Funds drained (or the daily limit moved) between
                // reservation and settlement.
                tx.fail(&err.to_string())?;
                self.transactions.update(tx).await?;
                return Err(err);
            }
        };

        if let Some(data) = provider_data {
            tx.annotate("provider", data);
        }
        tx.complete(previous, new)?;
        self.wallets.store(wallet.clone()).await?;
        if let Err(update_err) = self.transactions.update(tx.clone()).await {
            // Balance moved but the record did not settle; restore the
            // snapshot so the mutation is not observable.
            if let Err(restore_err) = self.wallets.store(snapshot).await {
                tracing::error!(
                    reference = %reference,
                    error = %restore_err,
                    "failed to restore wallet after settlement error, reconciliation required"
                );
            }
            return Err(update_err);
        }

        tracing::info!(reference = %reference, balance = %wallet.balance, "debit settled");
        Ok((wallet, tx))
    }

    /// Marks a pending debit as failed; the balance is untouched.
    pub async fn fail_debit(&self, reference: &str, reason: &str) -> Result<Transaction> {
        let stale = self
            .transactions
            .get(reference)
            .await?
            .ok_or_else(|| WalletError::TransactionNotFound(reference.to_string()))?;

        let guard = self.guard(stale.user_id).await;
        let _held = guard.lock().await;

        let mut tx = self
            .transactions
            .get(reference)
            .await?
            .ok_or_else(|| WalletError::TransactionNotFound(reference.to_string()))?;
        tx.fail(reason)?;
        self.transactions.update(tx.clone()).await?;
        tracing::info!(reference = %reference, reason, "debit failed without settlement");
        Ok(tx)
    }

    #[allow(clippy::too_many_arguments)]
    async fn credit_locked(
        &self,
        user_id: Uuid,
        amount: Amount,
        description: &str,
        reference: Option<String>,
        r#type: TransactionType,
        category: TransactionCategory,
        related: Option<String>,
    ) -> Result<(Wallet, Transaction)> {
        let mut wallet = self.load_active_wallet(user_id).await?;
        let (previous, new) = wallet.credit(amount);
        let mut tx = Transaction::completed(
            reference.unwrap_or_else(new_reference),
            wallet.id,
            user_id,
            r#type,
            amount,
            previous,
            new,
            category,
            description.to_string(),
        );
        tx.related_reference = related;

        self.transactions.insert(tx.clone()).await?;
        self.persist_or_compensate(wallet, tx).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn debit_locked(
        &self,
        user_id: Uuid,
        amount: Amount,
        description: &str,
        reference: Option<String>,
        r#type: TransactionType,
        category: TransactionCategory,
        related: Option<String>,
    ) -> Result<(Wallet, Transaction)> {
        let mut wallet = self.load_active_wallet(user_id).await?;
        let (previous, new) = wallet.debit(amount, Utc::now().date_naive())?;
        let mut tx = Transaction::completed(
            reference.unwrap_or_else(new_reference),
            wallet.id,
            user_id,
            r#type,
            amount,
            previous,
            new,
            category,
            description.to_string(),
        );
        tx.related_reference = related;

        self.transactions.insert(tx.clone()).await?;
        self.persist_or_compensate(wallet, tx).await
    }

    /// Stores the mutated wallet; if that fails the already-inserted
    /// record is cancelled so no half-written operation survives.
    async fn persist_or_compensate(
        &self,
        wallet: Wallet,
        mut tx: Transaction,
    ) -> Result<(Wallet, Transaction)> {
        if let Err(store_err) = self.wallets.store(wallet.clone()).await {
            tx.cancel("wallet store failed")?;
            if let Err(cancel_err) = self.transactions.update(tx).await {
                tracing::error!(
                    error = %cancel_err,
                    "failed to cancel orphaned transaction, reconciliation required"
                );
            }
            return Err(store_err);
        }
        Ok((wallet, tx))
    }
}
