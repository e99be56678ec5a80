use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// KYC verification tier, 0 through 3. Higher tiers unlock higher
/// per-transaction and daily spend caps; tier 3 is uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycLevel(u8);

impl KycLevel {
    pub fn new(level: u8) -> Self {
        Self(level.min(3))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    pub fn per_transaction_cap(&self) -> Option<Decimal> {
        match self.0 {
            0 => Some(dec!(5_000)),
            1 => Some(dec!(50_000)),
            2 => Some(dec!(200_000)),
            _ => None,
        }
    }

    pub fn daily_cap(&self) -> Option<Decimal> {
        match self.0 {
            0 => Some(dec!(20_000)),
            1 => Some(dec!(200_000)),
            2 => Some(dec!(1_000_000)),
            _ => None,
        }
    }
}

impl Default for KycLevel {
    fn default() -> Self {
        Self(0)
    }
}

/// A registered user. Signup and login live outside this crate; the fields
/// here are what the wallet components need: identity, the hashed
/// transaction PIN, and the KYC tier driving spend limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub password_hash: String,
    /// Argon2 hash of the 4-digit transaction PIN. `None` until setup.
    pub pin_hash: Option<String>,
    pub is_pin_setup: bool,
    pub is_active: bool,
    pub kyc_level: KycLevel,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: Uuid, password_hash: String, kyc_level: KycLevel) -> Self {
        Self {
            id,
            password_hash,
            pin_hash: None,
            is_pin_setup: false,
            is_active: true,
            kyc_level,
            created_at: Utc::now(),
        }
    }
}

/// Failed-PIN counter for one user. Reset on successful verification or
/// lock expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinAttemptRecord {
    pub attempts: u8,
    pub last_attempt: DateTime<Utc>,
    pub locked_until: Option<DateTime<Utc>>,
}

impl PinAttemptRecord {
    pub fn first_failure(now: DateTime<Utc>) -> Self {
        Self {
            attempts: 1,
            last_attempt: now,
            locked_until: None,
        }
    }

    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    pub fn lock_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now >= until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_kyc_level_clamped() {
        assert_eq!(KycLevel::new(7).level(), 3);
        assert_eq!(KycLevel::new(2).level(), 2);
    }

    #[test]
    fn test_kyc_caps() {
        assert_eq!(KycLevel::new(0).per_transaction_cap(), Some(dec!(5_000)));
        assert_eq!(KycLevel::new(3).per_transaction_cap(), None);
        assert_eq!(KycLevel::new(1).daily_cap(), Some(dec!(200_000)));
        assert_eq!(KycLevel::new(3).daily_cap(), None);
    }

    #[test]
    fn test_attempt_record_lock_window() {
        let now = Utc::now();
        let mut record = PinAttemptRecord::first_failure(now);
        assert!(!record.is_locked_at(now));

        record.locked_until = Some(now + Duration::minutes(15));
        assert!(record.is_locked_at(now));
        assert!(!record.is_locked_at(now + Duration::minutes(16)));
        assert!(record.lock_expired_at(now + Duration::minutes(16)));
    }
}
