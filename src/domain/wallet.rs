use crate::domain::money::{Amount, Balance};
use crate::domain::user::KycLevel;
use crate::error::WalletError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CURRENCY: &str = "NGN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Active,
    Frozen,
}

/// Running totals maintained by the ledger alongside the balance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletStats {
    pub total_credited: Decimal,
    pub total_debited: Decimal,
    pub transaction_count: u64,
}

/// Per-user monetary balance record. One wallet per user; the balance only
/// moves through the credit/debit methods below, which the Wallet Ledger
/// calls under the wallet's write guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Balance,
    pub currency: String,
    pub status: WalletStatus,
    pub stats: WalletStats,
    /// Daily debit cap inherited from the owner's KYC tier at creation.
    pub daily_limit: Option<Decimal>,
    pub spent_today: Decimal,
    pub spent_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(user_id: Uuid, kyc_level: KycLevel) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: Balance::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
            status: WalletStatus::Active,
            stats: WalletStats::default(),
            daily_limit: kyc_level.daily_cap(),
            spent_today: Decimal::ZERO,
            spent_on: now.date_naive(),
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }

    /// Resets the daily spend counter when `today` has moved past the day
    /// the counter was accumulated on.
    fn roll_day(&mut self, today: NaiveDate) {
        if today != self.spent_on {
            self.spent_on = today;
            self.spent_today = Decimal::ZERO;
        }
    }

    /// Remaining debit headroom for `today` under the daily limit.
    pub fn daily_headroom(&self, today: NaiveDate) -> Option<Decimal> {
        let limit = self.daily_limit?;
        let spent = if today == self.spent_on {
            self.spent_today
        } else {
            Decimal::ZERO
        };
        Some((limit - spent).max(Decimal::ZERO))
    }

    /// Applies a credit, returning the balance before and after.
    pub fn credit(&mut self, amount: Amount) -> (Balance, Balance) {
        let previous = self.balance;
        self.balance += amount;
        self.stats.total_credited += amount.value();
        self.stats.transaction_count += 1;
        (previous, self.balance)
    }

    /// Applies a debit, returning the balance before and after. Fails when
    /// funds are insufficient or the daily limit would be exceeded; balance
    /// and stats are untouched on failure.
    pub fn debit(
        &mut self,
        amount: Amount,
        today: NaiveDate,
    ) -> Result<(Balance, Balance), WalletError> {
        self.roll_day(today);

        if let Some(limit) = self.daily_limit
            && self.spent_today + amount.value() > limit
        {
            return Err(WalletError::LimitExceeded(format!(
                "daily limit {} would be exceeded",
                limit
            )));
        }

        let previous = self.balance;
        let next = self
            .balance
            .checked_sub(amount)
            .ok_or(WalletError::InsufficientBalance {
                available: previous.value(),
                required: amount.value(),
            })?;

        self.balance = next;
        self.stats.total_debited += amount.value();
        self.stats.transaction_count += 1;
        self.spent_today += amount.value();
        Ok((previous, next))
    }
}
