use crate::error::RegistryError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cumulative funds credited to an airline, in ether.
///
/// Balances only ever grow; there is no withdrawal path in the registry.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

/// A strictly positive amount carried by a funding transfer.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

/// Balance an airline must reach before it may act, as deployed.
pub const DEFAULT_FUNDING_THRESHOLD: Amount = Amount(dec!(10));

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, RegistryError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(RegistryError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = RegistryError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whether this balance meets or exceeds `threshold`.
    pub fn covers(&self, threshold: Amount) -> bool {
        self.0 >= threshold.0
    }

    /// Returns `self + amount`, or `None` if the sum exceeds `Decimal::MAX`.
    pub fn checked_add(&self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).map(Self)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
