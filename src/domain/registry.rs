use super::airline::AirlineRecord;
use super::flight::{FlightKey, FlightRecord};
use super::funds::Amount;
use super::identity::Identity;
use crate::error::{RegistryError, Result};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Complete registry ledger held in memory.
///
/// Every mutating method validates first and writes last, so an `Err` leaves
/// the state untouched.
#[derive(Debug, Clone)]
pub struct RegistryState {
    owner: Identity,
    operational: bool,
    funding_threshold: Amount,
    authorized_callers: BTreeSet<Identity>,
    airlines: HashMap<Identity, AirlineRecord>,
    flights: HashMap<FlightKey, FlightRecord>,
    registered_count: usize,
}

impl RegistryState {
    /// Creates a ledger owned by `owner` with `first_airline` already registered.
    ///
    /// The owner starts out as an authorized caller.
    pub fn new(owner: Identity, first_airline: Identity, funding_threshold: Amount) -> Self {
        let mut first = AirlineRecord::new(first_airline);
        first.registered = true;

        Self {
            owner,
            operational: true,
            funding_threshold,
            authorized_callers: BTreeSet::from([owner]),
            airlines: HashMap::from([(first_airline, first)]),
            flights: HashMap::new(),
            registered_count: 1,
        }
    }

    pub fn owner(&self) -> Identity {
        self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn set_operational(&mut self, caller: Identity, mode: bool) -> Result<()> {
        self.ensure_owner(caller)?;
        self.operational = mode;
        Ok(())
    }

    pub fn authorize_caller(&mut self, caller: Identity, target: Identity) -> Result<()> {
        self.ensure_owner(caller)?;
        self.authorized_callers.insert(target);
        Ok(())
    }

    pub fn revoke_caller(&mut self, caller: Identity, target: Identity) -> Result<()> {
        self.ensure_owner(caller)?;
        self.authorized_callers.remove(&target);
        Ok(())
    }

    pub fn is_authorized_caller(&self, target: Identity) -> bool {
        self.authorized_callers.contains(&target)
    }

    pub fn fund(&mut self, invoker: Identity, airline: Identity, amount: Amount) -> Result<bool> {
        self.ensure_authorized(invoker)?;
        let threshold = self.funding_threshold;
        let mut record = self
            .airlines
            .get(&airline)
            .cloned()
            .unwrap_or_else(|| AirlineRecord::new(airline));
        if record.credit(amount, threshold)? {
            info!(%airline, balance = %record.balance, "airline funded");
        }
        let funded = record.funded;
        self.airlines.insert(airline, record);
        Ok(funded)
    }

    pub fn register_airline_direct(&mut self, invoker: Identity, airline: Identity) -> Result<()> {
        self.ensure_authorized(invoker)?;
        if self.is_registered_airline(airline) {
            return Err(RegistryError::AlreadyRegistered(airline));
        }
        self.airline_entry(airline).activate()?;
        self.registered_count += 1;
        Ok(())
    }

    pub fn cast_vote(
        &mut self,
        invoker: Identity,
        candidate: Identity,
        voter: Identity,
    ) -> Result<usize> {
        self.ensure_authorized(invoker)?;
        if !self.is_registered_airline(voter) {
            return Err(RegistryError::UnknownVoter(voter));
        }
        if self.is_registered_airline(candidate) {
            return Err(RegistryError::AlreadyRegistered(candidate));
        }
        self.airline_entry(candidate).add_vote(voter)
    }

    /// Records `voter`'s vote for `candidate` and, if distinct votes reach
    /// `quorum`, registers the candidate in the same step. Returns the
    /// distinct vote count including this vote.
    pub fn cast_vote_and_maybe_activate(
        &mut self,
        invoker: Identity,
        candidate: Identity,
        voter: Identity,
        quorum: usize,
    ) -> Result<usize> {
        let votes = self.cast_vote(invoker, candidate, voter)?;
        if votes >= quorum {
            self.airline_entry(candidate).activate()?;
            self.registered_count += 1;
        }
        Ok(votes)
    }

    pub fn register_flight(&mut self, invoker: Identity, key: FlightKey) -> Result<FlightRecord> {
        self.ensure_authorized(invoker)?;
        if !self.airlines.get(&key.airline).is_some_and(AirlineRecord::is_eligible) {
            return Err(RegistryError::AirlineNotEligible(key.airline));
        }
        if self.flights.contains_key(&key) {
            return Err(RegistryError::DuplicateFlight {
                airline: key.airline,
                code: key.code,
                timestamp: key.timestamp,
            });
        }
        let record = FlightRecord::new(key.clone());
        self.flights.insert(key, record.clone());
        Ok(record)
    }

    pub fn airline_count(&self) -> usize {
        self.registered_count
    }

    pub fn is_registered_airline(&self, airline: Identity) -> bool {
        self.airlines.get(&airline).is_some_and(|a| a.registered)
    }

    pub fn is_funded(&self, airline: Identity) -> bool {
        self.airlines.get(&airline).is_some_and(|a| a.funded)
    }

    pub fn airline(&self, airline: Identity) -> Option<&AirlineRecord> {
        self.airlines.get(&airline)
    }

    pub fn flight(&self, key: &FlightKey) -> Option<&FlightRecord> {
        self.flights.get(key)
    }

    pub fn airlines(&self) -> impl Iterator<Item = &AirlineRecord> {
        self.airlines.values()
    }

    fn airline_entry(&mut self, airline: Identity) -> &mut AirlineRecord {
        self.airlines
            .entry(airline)
            .or_insert_with(|| AirlineRecord::new(airline))
    }

    fn ensure_owner(&self, caller: Identity) -> Result<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized(caller))
        }
    }

    fn ensure_authorized(&self, invoker: Identity) -> Result<()> {
        if self.is_authorized_caller(invoker) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized(invoker))
        }
    }
}
