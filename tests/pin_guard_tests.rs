mod common;

use chrono::Duration;
use rust_decimal_macros::dec;
use vaspay::application::pin_guard::{PinGuard, PinVerdict};
use vaspay::domain::ports::{Page, PinAttemptStore, TransactionFilter};
use vaspay::error::WalletError;

#[tokio::test]
async fn test_lockout_after_three_failures() {
    let backend = common::backend(true);
    let user_id = common::seed_user(&backend, 3, dec!(0.0)).await;
    let guard = backend.orchestrator.pin_guard();

    assert_eq!(
        guard.verify(user_id, "9999").await.unwrap(),
        PinVerdict::Rejected {
            attempts_remaining: 2
        }
    );
    assert_eq!(
        guard.verify(user_id, "9999").await.unwrap(),
        PinVerdict::Rejected {
            attempts_remaining: 1
        }
    );
    assert!(matches!(
        guard.verify(user_id, "9999").await.unwrap(),
        PinVerdict::Locked { .. }
    ));

    // Even the correct PIN is rejected while locked, and the attempt
    // counter does not move.
    assert!(matches!(
        guard.verify(user_id, common::PIN).await.unwrap(),
        PinVerdict::Locked { .. }
    ));
    let record = backend.pin_attempts.get(user_id).await.unwrap().unwrap();
    assert_eq!(record.attempts, 3);
}

#[tokio::test]
async fn test_success_resets_counter() {
    let backend = common::backend(true);
    let user_id = common::seed_user(&backend, 3, dec!(0.0)).await;
    let guard = backend.orchestrator.pin_guard();

    guard.verify(user_id, "9999").await.unwrap();
    guard.verify(user_id, "9999").await.unwrap();
    assert_eq!(
        guard.verify(user_id, common::PIN).await.unwrap(),
        PinVerdict::Verified
    );
    assert!(backend.pin_attempts.get(user_id).await.unwrap().is_none());

    // The next failure starts from a clean slate.
    assert_eq!(
        guard.verify(user_id, "9999").await.unwrap(),
        PinVerdict::Rejected {
            attempts_remaining: 2
        }
    );
}

#[tokio::test]
async fn test_expired_lock_resets_before_evaluation() {
    let backend = common::backend(true);
    let user_id = common::seed_user(&backend, 3, dec!(0.0)).await;

    // Zero-length lock window: the lock engages and immediately expires.
    let guard = PinGuard::with_policy(
        backend.users.clone(),
        backend.pin_attempts.clone(),
        3,
        Duration::zero(),
    );
    for _ in 0..3 {
        guard.verify(user_id, "9999").await.unwrap();
    }
    let record = backend.pin_attempts.get(user_id).await.unwrap().unwrap();
    assert!(record.locked_until.is_some());

    // The elapsed lock clears transparently and the correct PIN verifies.
    assert_eq!(
        guard.verify(user_id, common::PIN).await.unwrap(),
        PinVerdict::Verified
    );
}

#[tokio::test]
async fn test_setup_rules() {
    let backend = common::backend(true);
    let user_id = common::seed_user(&backend, 3, dec!(0.0)).await;
    let guard = backend.orchestrator.pin_guard();

    // seed_user already configured a PIN.
    assert!(matches!(
        guard.setup(user_id, "2580", "2580").await,
        Err(WalletError::Validation(_))
    ));

    let fresh = vaspay::domain::user::User::new(
        uuid::Uuid::new_v4(),
        "pw".to_string(),
        vaspay::domain::user::KycLevel::new(1),
    );
    backend.users.store(fresh.clone()).await.unwrap();

    // Verification requires setup first.
    assert!(matches!(
        guard.verify(fresh.id, "2580").await,
        Err(WalletError::PinNotConfigured)
    ));

    // Weak or mismatched PINs never make it into the store.
    assert!(guard.setup(fresh.id, "1111", "1111").await.is_err());
    assert!(guard.setup(fresh.id, "1234", "1234").await.is_err());
    assert!(guard.setup(fresh.id, "2580", "2581").await.is_err());
    assert!(guard.setup(fresh.id, "2580", "2580").await.is_ok());
    assert_eq!(
        guard.verify(fresh.id, "2580").await.unwrap(),
        PinVerdict::Verified
    );
}

#[tokio::test]
async fn test_locked_purchase_short_circuits() {
    let backend = common::backend(true);
    let user_id = common::seed_user(&backend, 3, dec!(5_000.0)).await;
    let guard = backend.orchestrator.pin_guard();

    for _ in 0..3 {
        guard.verify(user_id, "9999").await.unwrap();
    }

    let result = backend
        .orchestrator
        .purchase(user_id, &common::airtime_request(dec!(1_000.0), common::PIN))
        .await;
    assert!(matches!(result, Err(WalletError::AccountLocked { .. })));

    // Short-circuited before any ledger effect or provider call.
    assert_eq!(backend.provider.call_count(), 0);
    let records = backend
        .ledger
        .transactions(user_id, &TransactionFilter::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(records.len(), 1, "only the seed funding record exists");
}
