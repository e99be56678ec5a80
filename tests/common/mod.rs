#![allow(dead_code)]

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use vaspay::application::betting_retry::BettingRetryManager;
use vaspay::application::ledger::WalletLedger;
use vaspay::application::orchestrator::{OrchestratorConfig, PurchaseOrchestrator};
use vaspay::application::pin_guard::PinGuard;
use vaspay::domain::money::Amount;
use vaspay::domain::ports::{
    PinAttemptStoreRef, TransactionStoreRef, UserStore, UserStoreRef, WalletStoreRef,
};
use vaspay::domain::product::{ProductCatalog, PurchaseRequest};
use vaspay::domain::user::{KycLevel, User};
use vaspay::infrastructure::in_memory::{
    InMemoryPinAttemptStore, InMemoryTransactionStore, InMemoryUserStore, InMemoryWalletStore,
};
use vaspay::processors::ProcessorRegistry;
use vaspay::processors::provider::ScriptedProvider;

pub const PIN: &str = "2580";

pub struct Backend {
    pub users: UserStoreRef,
    pub wallets: WalletStoreRef,
    pub transactions: TransactionStoreRef,
    pub pin_attempts: PinAttemptStoreRef,
    pub ledger: Arc<WalletLedger>,
    pub orchestrator: PurchaseOrchestrator,
    pub retries: BettingRetryManager,
    pub provider: Arc<ScriptedProvider>,
}

pub fn backend_with_provider(provider: Arc<ScriptedProvider>) -> Backend {
    let users: UserStoreRef = Arc::new(InMemoryUserStore::new());
    let wallets: WalletStoreRef = Arc::new(InMemoryWalletStore::new());
    let transactions: TransactionStoreRef = Arc::new(InMemoryTransactionStore::new());
    let pin_attempts: PinAttemptStoreRef = Arc::new(InMemoryPinAttemptStore::new());

    let ledger = Arc::new(WalletLedger::new(wallets.clone(), transactions.clone()));
    let registry = Arc::new(ProcessorRegistry::with_provider(provider.clone()));
    let config = OrchestratorConfig {
        provider_timeout: Duration::from_secs(5),
    };
    let orchestrator = PurchaseOrchestrator::with_config(
        users.clone(),
        ledger.clone(),
        PinGuard::new(users.clone(), pin_attempts.clone()),
        registry.clone(),
        ProductCatalog::default(),
        config.clone(),
    );
    let retries = BettingRetryManager::new(
        ledger.clone(),
        transactions.clone(),
        registry,
        config.provider_timeout,
    );

    Backend {
        users,
        wallets,
        transactions,
        pin_attempts,
        ledger,
        orchestrator,
        retries,
        provider,
    }
}

/// Backend whose provider always approves or always declines.
pub fn backend(approved: bool) -> Backend {
    backend_with_provider(Arc::new(ScriptedProvider::always(approved)))
}

/// Backend whose provider replays the given outcome sequence.
pub fn backend_seq(outcomes: Vec<bool>) -> Backend {
    backend_with_provider(Arc::new(ScriptedProvider::sequence(outcomes)))
}

/// Registers a user with a funded wallet and a configured PIN.
pub async fn seed_user(backend: &Backend, kyc_level: u8, balance: Decimal) -> Uuid {
    let user = User::new(Uuid::new_v4(), "pw-hash".to_string(), KycLevel::new(kyc_level));
    backend.users.store(user.clone()).await.unwrap();
    backend.ledger.open_wallet(&user).await.unwrap();
    backend
        .orchestrator
        .pin_guard()
        .setup(user.id, PIN, PIN)
        .await
        .unwrap();
    if balance > Decimal::ZERO {
        backend
            .ledger
            .credit(
                user.id,
                Amount::new(balance).unwrap(),
                "Seed funding",
                None,
            )
            .await
            .unwrap();
    }
    user.id
}

pub fn airtime_request(amount: Decimal, pin: &str) -> PurchaseRequest {
    serde_json::from_value(serde_json::json!({
        "type": "airtime",
        "amount": amount,
        "pin": pin,
        "network": "mtn",
        "phone": "08031234567",
    }))
    .unwrap()
}

pub fn betting_request(amount: Decimal, pin: &str) -> PurchaseRequest {
    serde_json::from_value(serde_json::json!({
        "type": "betting",
        "amount": amount,
        "pin": pin,
        "provider": "bet9ja",
        "customer_id": "BJ90211",
    }))
    .unwrap()
}
