use super::funds::{Amount, Balance};
use super::identity::Identity;
use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The registry's view of a single airline.
///
/// A record comes into existence the first time an identity is funded, voted
/// for, or registered. `registered` and `funded` each flip at most once and
/// never revert.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AirlineRecord {
    /// The airline's identity.
    pub airline: Identity,
    /// Whether the airline has been admitted to the registry.
    pub registered: bool,
    /// Whether the airline's balance has crossed the funding threshold.
    pub funded: bool,
    /// Total funds credited so far.
    pub balance: Balance,
    /// Distinct registered airlines that voted to admit this one.
    /// Always empty once `registered` is true.
    pub votes: BTreeSet<Identity>,
}

impl AirlineRecord {
    pub fn new(airline: Identity) -> Self {
        Self {
            airline,
            registered: false,
            funded: false,
            balance: Balance::ZERO,
            votes: BTreeSet::new(),
        }
    }

    /// Registered and funded: may sponsor candidates and register flights.
    pub fn is_eligible(&self) -> bool {
        self.registered && self.funded
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// Credits `amount` and returns `true` if this credit is the one that
    /// crossed `threshold`. On overflow the record is left untouched.
    pub fn credit(&mut self, amount: Amount, threshold: Amount) -> Result<bool, RegistryError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| RegistryError::ValidationError("balance overflow".to_string()))?;
        if !self.funded && self.balance.covers(threshold) {
            self.funded = true;
            return Ok(true);
        }
        Ok(false)
    }

    /// Records a vote from `voter`. Repeated votes from the same voter are
    /// absorbed. Returns the number of distinct voters.
    pub fn add_vote(&mut self, voter: Identity) -> Result<usize, RegistryError> {
        if self.registered {
            return Err(RegistryError::AlreadyRegistered(self.airline));
        }
        self.votes.insert(voter);
        Ok(self.votes.len())
    }

    /// Admits the airline and discards its pending votes.
    pub fn activate(&mut self) -> Result<(), RegistryError> {
        if self.registered {
            return Err(RegistryError::AlreadyRegistered(self.airline));
        }
        self.registered = true;
        self.votes.clear();
        Ok(())
    }
}
