use crate::error::WalletError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// A strictly positive monetary amount, the only unit accepted by ledger
/// operations.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, WalletError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(WalletError::Validation(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A wallet balance. Constructed at zero and only moved through the checked
/// operations below, so it never goes negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn covers(&self, amount: Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Subtracts `amount`, returning `None` when the result would be
    /// negative.
    pub fn checked_sub(self, amount: Amount) -> Option<Self> {
        if self.covers(amount) {
            Some(Self(self.0 - amount.value()))
        } else {
            None
        }
    }
}

impl Add<Amount> for Balance {
    type Output = Self;

    fn add(self, rhs: Amount) -> Self::Output {
        Self(self.0 + rhs.value())
    }
}

impl AddAssign<Amount> for Balance {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.value();
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(WalletError::Validation(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-5.0)),
            Err(WalletError::Validation(_))
        ));
    }

    #[test]
    fn test_balance_checked_sub() {
        let balance = Balance::new(dec!(100.0));
        let debit = Amount::new(dec!(40.0)).unwrap();
        assert_eq!(balance.checked_sub(debit), Some(Balance::new(dec!(60.0))));

        let too_much = Amount::new(dec!(150.0)).unwrap();
        assert_eq!(balance.checked_sub(too_much), None);
    }

    #[test]
    fn test_balance_add_amount() {
        let mut balance = Balance::ZERO;
        balance += Amount::new(dec!(25.5)).unwrap();
        assert_eq!(balance, Balance::new(dec!(25.5)));
        assert_eq!(
            balance + Amount::new(dec!(4.5)).unwrap(),
            Balance::new(dec!(30.0))
        );
    }
}
