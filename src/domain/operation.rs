use super::funds::Amount;
use super::identity::Identity;
use crate::error::{RegistryError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Fund,
    RegisterAirline,
    RegisterFlight,
    SetOperational,
    AuthorizeCaller,
    RevokeCaller,
}

/// A single request against the registry, as read from an operations feed.
///
/// Which optional fields are required depends on `type`:
/// `fund` needs `amount`; `register_airline`, `authorize_caller` and
/// `revoke_caller` need `target`; `register_flight` needs `flight` and
/// `timestamp`; `set_operational` needs `mode`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Operation {
    pub r#type: OperationType,
    pub caller: Identity,
    pub target: Option<Identity>,
    pub amount: Option<Decimal>,
    pub flight: Option<String>,
    pub timestamp: Option<u64>,
    pub mode: Option<bool>,
}

impl Operation {
    pub fn target(&self) -> Result<Identity> {
        self.target.ok_or_else(|| self.missing("target"))
    }

    pub fn amount(&self) -> Result<Amount> {
        let amount = self.amount.ok_or_else(|| self.missing("amount"))?;
        Amount::new(amount)
    }

    pub fn flight(&self) -> Result<(&str, u64)> {
        let code = self
            .flight
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| self.missing("flight"))?;
        let timestamp = self.timestamp.ok_or_else(|| self.missing("timestamp"))?;
        Ok((code, timestamp))
    }

    pub fn mode(&self) -> Result<bool> {
        self.mode.ok_or_else(|| self.missing("mode"))
    }

    fn missing(&self, field: &str) -> RegistryError {
        RegistryError::ValidationError(format!(
            "{:?} operation is missing {}",
            self.r#type, field
        ))
    }
}
