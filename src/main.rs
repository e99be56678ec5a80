use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vaspay::application::betting_retry::BettingRetryManager;
use vaspay::application::ledger::WalletLedger;
use vaspay::application::orchestrator::{OrchestratorConfig, PurchaseOrchestrator};
use vaspay::application::pin_guard::PinGuard;
use vaspay::domain::money::Amount;
use vaspay::domain::ports::{
    PinAttemptStoreRef, TransactionStoreRef, UserStore, UserStoreRef, WalletStore, WalletStoreRef,
};
use vaspay::domain::user::{KycLevel, User};
use vaspay::infrastructure::in_memory::{
    InMemoryPinAttemptStore, InMemoryTransactionStore, InMemoryUserStore, InMemoryWalletStore,
};
use vaspay::interfaces::csv::StatementWriter;
use vaspay::interfaces::jsonl::{OperationReader, OperationRequest};
use vaspay::processors::ProcessorRegistry;
use vaspay::processors::provider::SimulatedProvider;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations file (JSON lines)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

struct Stores {
    users: UserStoreRef,
    wallets: WalletStoreRef,
    transactions: TransactionStoreRef,
    pin_attempts: PinAttemptStoreRef,
}

fn in_memory_stores() -> Stores {
    Stores {
        users: Arc::new(InMemoryUserStore::new()),
        wallets: Arc::new(InMemoryWalletStore::new()),
        transactions: Arc::new(InMemoryTransactionStore::new()),
        pin_attempts: Arc::new(InMemoryPinAttemptStore::new()),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn persistent_stores(path: PathBuf) -> Result<Stores> {
    use vaspay::infrastructure::rocksdb::RocksDbStore;

    let store = RocksDbStore::open(path).into_diagnostic()?;
    Ok(Stores {
        users: Arc::new(store.clone()),
        wallets: Arc::new(store.clone()),
        transactions: Arc::new(store.clone()),
        pin_attempts: Arc::new(store),
    })
}

fn build_stores(db_path: Option<PathBuf>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => persistent_stores(path),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            eprintln!(
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(in_memory_stores())
        }
        None => Ok(in_memory_stores()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the final statement.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let stores = build_stores(cli.db_path)?;

    let ledger = Arc::new(WalletLedger::new(
        stores.wallets.clone(),
        stores.transactions.clone(),
    ));
    let registry = Arc::new(ProcessorRegistry::with_provider(Arc::new(
        SimulatedProvider::default(),
    )));
    let pin_guard = PinGuard::new(stores.users.clone(), stores.pin_attempts.clone());
    let orchestrator = PurchaseOrchestrator::new(
        stores.users.clone(),
        ledger.clone(),
        pin_guard,
        registry.clone(),
    );
    let retries = BettingRetryManager::new(
        ledger.clone(),
        stores.transactions.clone(),
        registry,
        OrchestratorConfig::default().provider_timeout,
    );

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = execute(&op, &stores, &ledger, &orchestrator, &retries).await {
                    eprintln!("Error processing operation: {}", e);
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {}", e);
            }
        }
    }

    let wallets = stores.wallets.get_all().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = StatementWriter::new(stdout.lock());
    writer.write_statement(wallets).into_diagnostic()?;

    Ok(())
}

async fn execute(
    op: &OperationRequest,
    stores: &Stores,
    ledger: &Arc<WalletLedger>,
    orchestrator: &PurchaseOrchestrator,
    retries: &BettingRetryManager,
) -> vaspay::error::Result<()> {
    match op {
        OperationRequest::Register {
            user_id,
            password_hash,
            kyc_level,
        } => {
            let user = User::new(*user_id, password_hash.clone(), KycLevel::new(*kyc_level));
            stores.users.store(user.clone()).await?;
            ledger.open_wallet(&user).await?;
        }
        OperationRequest::SetupPin {
            user_id,
            pin,
            confirm_pin,
        } => {
            orchestrator.pin_guard().setup(*user_id, pin, confirm_pin).await?;
        }
        OperationRequest::Fund {
            user_id,
            amount,
            description,
        } => {
            let amount = Amount::new(*amount)?;
            let description = description.as_deref().unwrap_or("Wallet funding");
            ledger.credit(*user_id, amount, description, None).await?;
        }
        OperationRequest::Transfer {
            user_id,
            recipient,
            amount,
            description,
        } => {
            let amount = Amount::new(*amount)?;
            let description = description.as_deref().unwrap_or("Wallet transfer");
            ledger
                .transfer(*user_id, *recipient, amount, description)
                .await?;
        }
        OperationRequest::Purchase { user_id, request } => {
            let receipt = orchestrator.purchase(*user_id, request).await?;
            tracing::info!(
                reference = %receipt.transaction.reference,
                success = receipt.success,
                message = %receipt.message,
                "purchase processed"
            );
        }
        OperationRequest::RetryBet { reference } => {
            let receipt = retries.retry(reference).await?;
            tracing::info!(
                reference = %receipt.transaction.reference,
                success = receipt.success,
                "betting retry processed"
            );
        }
        OperationRequest::Freeze { user_id } => {
            ledger.freeze(*user_id).await?;
        }
        OperationRequest::Unfreeze { user_id } => {
            ledger.unfreeze(*user_id).await?;
        }
    }
    Ok(())
}
