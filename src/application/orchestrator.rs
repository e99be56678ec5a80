use crate::application::ledger::WalletLedger;
use crate::application::pin_guard::{PinGuard, PinVerdict, pin_format_ok};
use crate::domain::money::Amount;
use crate::domain::ports::{ProcessorOutcome, ServiceProcessor, UserStore, UserStoreRef};
use crate::domain::product::{ProductCatalog, ProductType, PurchaseReceipt, PurchaseRequest};
use crate::domain::transaction::TransactionCategory;
use crate::error::{Result, WalletError};
use crate::processors::ProcessorRegistry;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on one provider call. An elapsed timer is a failure
    /// outcome, never a success.
    pub provider_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
        }
    }
}

/// Turns one purchase request into a consistent ledger mutation plus an
/// external side effect: validate, authorize via the PIN guard, reserve a
/// pending debit, dispatch the product's processor, then settle or fail the
/// reservation. The wallet is only debited when the processor reports
/// success.
pub struct PurchaseOrchestrator {
    users: UserStoreRef,
    ledger: Arc<WalletLedger>,
    pin_guard: PinGuard,
    registry: Arc<ProcessorRegistry>,
    catalog: ProductCatalog,
    config: OrchestratorConfig,
}

impl PurchaseOrchestrator {
    pub fn new(
        users: UserStoreRef,
        ledger: Arc<WalletLedger>,
        pin_guard: PinGuard,
        registry: Arc<ProcessorRegistry>,
    ) -> Self {
        Self::with_config(
            users,
            ledger,
            pin_guard,
            registry,
            ProductCatalog::default(),
            OrchestratorConfig::default(),
        )
    }

    pub fn with_config(
        users: UserStoreRef,
        ledger: Arc<WalletLedger>,
        pin_guard: PinGuard,
        registry: Arc<ProcessorRegistry>,
        catalog: ProductCatalog,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            users,
            ledger,
            pin_guard,
            registry,
            catalog,
            config,
        }
    }

    pub fn pin_guard(&self) -> &PinGuard {
        &self.pin_guard
    }

    pub async fn purchase(
        &self,
        user_id: Uuid,
        request: &PurchaseRequest,
    ) -> Result<PurchaseReceipt> {
        // Shape first: nothing below runs on malformed input.
        if !pin_format_ok(&request.pin) {
            return Err(WalletError::Validation(
                "PIN must be exactly 4 digits".to_string(),
            ));
        }
        let amount = Amount::new(request.amount)?;
        let bounds = self.catalog.bounds(request.product);
        if !bounds.contains(request.amount) {
            return Err(WalletError::Validation(format!(
                "{} amount must be between {} and {}",
                request.product, bounds.min, bounds.max
            )));
        }

        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound(user_id))?;
        let wallet = self.ledger.wallet(user_id).await?;
        if !user.is_pin_setup {
            return Err(WalletError::PinNotConfigured);
        }

        // The guard short-circuits before any ledger effect or provider
        // call; a valid PIN resets the attempt counter no matter what the
        // processor later reports.
        match self.pin_guard.verify(user_id, &request.pin).await? {
            PinVerdict::Verified => {}
            PinVerdict::Rejected { attempts_remaining } => {
                return Err(WalletError::InvalidPin { attempts_remaining });
            }
            PinVerdict::Locked { remaining } => {
                return Err(WalletError::AccountLocked {
                    minutes_remaining: (remaining.num_seconds() + 59) / 60,
                });
            }
        }

        if let Some(cap) = user.kyc_level.per_transaction_cap()
            && request.amount > cap
        {
            return Err(WalletError::LimitExceeded(format!(
                "amount exceeds the per-transaction cap {} for KYC level {}",
                cap,
                user.kyc_level.level()
            )));
        }
        if !wallet.balance.covers(amount) {
            return Err(WalletError::InsufficientBalance {
                available: wallet.balance.value(),
                required: amount.value(),
            });
        }

        let processor = self
            .registry
            .get(request.product)
            .ok_or_else(|| WalletError::UnknownProduct(request.product.to_string()))?;

        let (category, metadata) = purchase_metadata(request);
        let description = format!("{} purchase", request.product);
        let pending = self
            .ledger
            .begin_debit(user_id, amount, &description, category, metadata)
            .await?;
        let reference = pending.reference.clone();

        let outcome = match tokio::time::timeout(
            self.config.provider_timeout,
            processor.process(request, &reference),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(reference = %reference, product = %request.product, "provider call timed out");
                ProcessorOutcome::declined(&reference, &description, "provider timed out")
            }
        };

        if outcome.success {
            let (wallet, tx) = self
                .ledger
                .commit_debit(&reference, Some(outcome.data))
                .await?;
            tracing::info!(reference = %reference, product = %request.product, "purchase completed");
            Ok(PurchaseReceipt {
                success: true,
                message: outcome.message,
                transaction: tx,
                new_balance: Some(wallet.balance.value()),
            })
        } else {
            let tx = self.ledger.fail_debit(&reference, &outcome.message).await?;
            tracing::info!(
                reference = %reference,
                product = %request.product,
                reason = %outcome.message,
                "purchase declined"
            );
            Ok(PurchaseReceipt {
                success: false,
                message: outcome.message,
                transaction: tx,
                new_balance: None,
            })
        }
    }
}

/// Category and initial metadata for the pending record. Betting carries
/// the retry bookkeeping from the start; everything else keeps its product
/// fields for support lookups.
fn purchase_metadata(request: &PurchaseRequest) -> (TransactionCategory, Value) {
    if request.product == ProductType::Betting {
        let metadata = json!({
            "product": request.product.to_string(),
            "betting": {
                "provider": request.field("provider"),
                "customer_id": request.field("customer_id"),
                "retry_count": 0,
            },
        });
        (TransactionCategory::Betting, metadata)
    } else {
        let metadata = json!({
            "product": request.product.to_string(),
            "fields": Value::Object(request.fields.clone()),
        });
        (TransactionCategory::Payment, metadata)
    }
}
