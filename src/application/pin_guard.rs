use crate::domain::ports::{PinAttemptStore, PinAttemptStoreRef, UserStore, UserStoreRef};
use crate::error::{Result, WalletError};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{Duration, Utc};
use uuid::Uuid;

pub const MAX_PIN_ATTEMPTS: u8 = 3;
pub const PIN_LOCK_MINUTES: i64 = 15;

/// Result of one PIN verification.
#[derive(Debug, Clone, PartialEq)]
pub enum PinVerdict {
    Verified,
    Rejected { attempts_remaining: u8 },
    Locked { remaining: Duration },
}

/// Attempt-limited PIN verification.
///
/// Per user the state is `Unlocked(attempts)`; the third consecutive
/// failure engages a lock, which expires on its own and resets the counter
/// before the next evaluation. Success at any count also resets. Attempt
/// state lives behind a store port so every instance serving the same user
/// sees the same counter.
pub struct PinGuard {
    users: UserStoreRef,
    attempts: PinAttemptStoreRef,
    max_attempts: u8,
    lock_duration: Duration,
}

impl PinGuard {
    pub fn new(users: UserStoreRef, attempts: PinAttemptStoreRef) -> Self {
        Self::with_policy(
            users,
            attempts,
            MAX_PIN_ATTEMPTS,
            Duration::minutes(PIN_LOCK_MINUTES),
        )
    }

    pub fn with_policy(
        users: UserStoreRef,
        attempts: PinAttemptStoreRef,
        max_attempts: u8,
        lock_duration: Duration,
    ) -> Self {
        Self {
            users,
            attempts,
            max_attempts,
            lock_duration,
        }
    }

    /// One-time PIN setup. Rejects weak PINs here so `verify` never has to.
    pub async fn setup(&self, user_id: Uuid, pin: &str, confirm: &str) -> Result<()> {
        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound(user_id))?;

        if user.is_pin_setup {
            return Err(WalletError::Validation(
                "transaction PIN is already set up".to_string(),
            ));
        }
        if pin != confirm {
            return Err(WalletError::Validation(
                "PIN confirmation does not match".to_string(),
            ));
        }
        validate_pin_strength(pin)?;

        user.pin_hash = Some(hash_pin(pin)?);
        user.is_pin_setup = true;
        self.users.store(user).await?;
        tracing::info!(user_id = %user_id, "transaction PIN configured");
        Ok(())
    }

    pub async fn verify(&self, user_id: Uuid, candidate: &str) -> Result<PinVerdict> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(WalletError::UserNotFound(user_id))?;
        if !user.is_pin_setup {
            return Err(WalletError::PinNotConfigured);
        }
        let hash = user.pin_hash.as_deref().ok_or(WalletError::PinNotConfigured)?;

        let now = Utc::now();
        if let Some(record) = self.attempts.get(user_id).await? {
            if record.is_locked_at(now) {
                let until = record.locked_until.unwrap_or(now);
                return Ok(PinVerdict::Locked {
                    remaining: until - now,
                });
            }
            if record.lock_expired_at(now) {
                // Lock window elapsed; start fresh before evaluating.
                self.attempts.clear(user_id).await?;
            }
        }

        if verify_pin(hash, candidate) {
            self.attempts.clear(user_id).await?;
            return Ok(PinVerdict::Verified);
        }

        let record = self
            .attempts
            .record_failure(user_id, self.max_attempts, self.lock_duration)
            .await?;
        if record.locked_until.is_some() {
            tracing::warn!(
                user_id = %user_id,
                attempts = record.attempts,
                "PIN attempts exhausted, account locked"
            );
            Ok(PinVerdict::Locked {
                remaining: self.lock_duration,
            })
        } else {
            Ok(PinVerdict::Rejected {
                attempts_remaining: self.max_attempts.saturating_sub(record.attempts),
            })
        }
    }

    /// Clears attempt state for a user.
    pub async fn reset(&self, user_id: Uuid) -> Result<()> {
        self.attempts.clear(user_id).await
    }
}

pub fn pin_format_ok(pin: &str) -> bool {
    pin.len() == 4 && pin.chars().all(|c| c.is_ascii_digit())
}

/// Rejects PINs that are trivially guessable: repeated digits and
/// sequential ascending/descending runs.
fn validate_pin_strength(pin: &str) -> Result<()> {
    if !pin_format_ok(pin) {
        return Err(WalletError::Validation(
            "PIN must be exactly 4 digits".to_string(),
        ));
    }

    let digits: Vec<i16> = pin.bytes().map(|b| (b - b'0') as i16).collect();
    if digits.iter().all(|d| *d == digits[0]) {
        return Err(WalletError::Validation(
            "PIN must not repeat a single digit".to_string(),
        ));
    }
    let ascending = digits.windows(2).all(|w| w[1] - w[0] == 1);
    let descending = digits.windows(2).all(|w| w[0] - w[1] == 1);
    if ascending || descending {
        return Err(WalletError::Validation(
            "PIN must not be a sequential run".to_string(),
        ));
    }
    Ok(())
}

fn hash_pin(pin: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| WalletError::Storage(format!("PIN hashing failed: {e}")))
}

fn verify_pin(stored_hash: &str, candidate: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .is_ok()
}
