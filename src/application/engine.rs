use crate::config::RegistryConfig;
use crate::domain::airline::AirlineRecord;
use crate::domain::flight::{FlightKey, FlightRecord};
use crate::domain::funds::Amount;
use crate::domain::identity::Identity;
use crate::domain::operation::{Operation, OperationType};
use crate::domain::ports::RegistryStoreBox;
use crate::error::{RegistryError, Result};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Result of a successful `register_airline` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The candidate is now a registered airline.
    Registered,
    /// The vote was recorded; the candidate still needs `quorum - votes` more.
    Pending { votes: usize, quorum: usize },
}

/// Distinct votes needed to admit a candidate when `registered` airlines exist.
pub fn quorum(registered: usize) -> usize {
    registered.div_ceil(2)
}

/// The governance layer in front of a [`RegistryStore`](crate::domain::ports::RegistryStore).
///
/// `GovernanceEngine` decides who may register airlines and flights and when a
/// candidate becomes active. It owns no registry state: every decision is made
/// from the store's current contents.
///
/// All mutations, administrative ones included, run under one exclusive gate
/// so that reading state, validating, and writing happen as a single step.
/// Reads share the gate with each other.
pub struct GovernanceEngine {
    identity: Identity,
    store: RegistryStoreBox,
    bootstrap_threshold: usize,
    gate: RwLock<()>,
}

impl GovernanceEngine {
    /// Creates a new `GovernanceEngine`.
    ///
    /// # Arguments
    ///
    /// * `identity` - The identity the engine presents to the store. The store
    ///   owner must authorize it before business operations succeed.
    /// * `store` - The registry store.
    /// * `config` - Registry parameters.
    pub fn new(identity: Identity, store: RegistryStoreBox, config: &RegistryConfig) -> Self {
        Self {
            identity,
            store,
            bootstrap_threshold: config.bootstrap_threshold,
            gate: RwLock::new(()),
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Registers `candidate` on behalf of `caller`.
    ///
    /// While fewer than the bootstrap threshold of airlines are registered,
    /// the candidate is admitted immediately. Afterwards the call counts as
    /// `caller`'s vote and the candidate is admitted once distinct votes reach
    /// half of the registered airlines, rounded up.
    pub async fn register_airline(
        &self,
        caller: Identity,
        candidate: Identity,
    ) -> Result<RegistrationOutcome> {
        let _gate = self.gate.write().await;
        self.require_operational().await?;

        let sponsor = self.store.get_airline(caller).await?;
        if !sponsor.is_some_and(|a| a.is_eligible()) {
            return Err(RegistryError::CallerNotFunded(caller));
        }
        if self.store.is_registered_airline(candidate).await? {
            return Err(RegistryError::AlreadyRegistered(candidate));
        }

        let registered = self.store.airline_count().await?;
        if registered < self.bootstrap_threshold {
            self.store
                .register_airline_direct(self.identity, candidate)
                .await?;
            info!(%candidate, sponsor = %caller, "airline registered during bootstrap");
            return Ok(RegistrationOutcome::Registered);
        }

        let quorum = quorum(registered);
        let votes = self
            .store
            .cast_vote_and_maybe_activate(self.identity, candidate, caller, quorum)
            .await?;
        debug!(%candidate, voter = %caller, votes, quorum, "vote recorded");

        if votes >= quorum {
            info!(%candidate, votes, quorum, "airline registered by consensus");
            Ok(RegistrationOutcome::Registered)
        } else {
            Ok(RegistrationOutcome::Pending { votes, quorum })
        }
    }

    /// Credits `amount` to `caller`. Returns whether `caller` is now funded.
    pub async fn fund(&self, caller: Identity, amount: Amount) -> Result<bool> {
        let _gate = self.gate.write().await;
        self.require_operational().await?;

        let funded = self.store.fund(self.identity, caller, amount).await?;
        debug!(airline = %caller, %amount, funded, "funds credited");
        Ok(funded)
    }

    /// Registers a flight operated by `caller`.
    pub async fn register_flight(
        &self,
        caller: Identity,
        code: impl Into<String>,
        timestamp: u64,
    ) -> Result<FlightRecord> {
        let _gate = self.gate.write().await;
        self.require_operational().await?;

        let airline = self.store.get_airline(caller).await?;
        if !airline.is_some_and(|a| a.is_eligible()) {
            return Err(RegistryError::AirlineNotEligible(caller));
        }

        let flight = self
            .store
            .register_flight(self.identity, FlightKey::new(caller, code, timestamp))
            .await?;
        info!(airline = %caller, code = %flight.code, timestamp, "flight registered");
        Ok(flight)
    }

    /// Owner-only. Not gated by the operational flag.
    pub async fn set_operational(&self, caller: Identity, mode: bool) -> Result<()> {
        let _gate = self.gate.write().await;
        self.store.set_operational(caller, mode).await
    }

    /// Owner-only.
    pub async fn authorize_caller(&self, caller: Identity, target: Identity) -> Result<()> {
        let _gate = self.gate.write().await;
        self.store.authorize_caller(caller, target).await
    }

    /// Owner-only.
    pub async fn revoke_caller(&self, caller: Identity, target: Identity) -> Result<()> {
        let _gate = self.gate.write().await;
        self.store.revoke_caller(caller, target).await
    }

    pub async fn is_operational(&self) -> Result<bool> {
        let _gate = self.gate.read().await;
        self.store.is_operational().await
    }

    pub async fn airline_count(&self) -> Result<usize> {
        let _gate = self.gate.read().await;
        self.store.airline_count().await
    }

    pub async fn is_registered_airline(&self, airline: Identity) -> Result<bool> {
        let _gate = self.gate.read().await;
        self.store.is_registered_airline(airline).await
    }

    pub async fn is_funded(&self, airline: Identity) -> Result<bool> {
        let _gate = self.gate.read().await;
        self.store.is_funded(airline).await
    }

    pub async fn airline(&self, airline: Identity) -> Result<Option<AirlineRecord>> {
        let _gate = self.gate.read().await;
        self.store.get_airline(airline).await
    }

    pub async fn flight(&self, key: &FlightKey) -> Result<Option<FlightRecord>> {
        let _gate = self.gate.read().await;
        self.store.get_flight(key).await
    }

    pub async fn airlines(&self) -> Result<Vec<AirlineRecord>> {
        let _gate = self.gate.read().await;
        self.store.all_airlines().await
    }

    /// Dispatches an operation read from an operations feed.
    pub async fn process_operation(&self, op: Operation) -> Result<()> {
        match op.r#type {
            OperationType::Fund => {
                self.fund(op.caller, op.amount()?).await?;
            }
            OperationType::RegisterAirline => {
                self.register_airline(op.caller, op.target()?).await?;
            }
            OperationType::RegisterFlight => {
                let (code, timestamp) = op.flight()?;
                self.register_flight(op.caller, code, timestamp).await?;
            }
            OperationType::SetOperational => {
                self.set_operational(op.caller, op.mode()?).await?;
            }
            OperationType::AuthorizeCaller => {
                self.authorize_caller(op.caller, op.target()?).await?;
            }
            OperationType::RevokeCaller => {
                self.revoke_caller(op.caller, op.target()?).await?;
            }
        }
        Ok(())
    }

    /// Consumes the engine and returns every airline record, ordered by identity.
    pub async fn into_results(self) -> Result<Vec<AirlineRecord>> {
        self.store.all_airlines().await
    }

    async fn require_operational(&self) -> Result<()> {
        if self.store.is_operational().await? {
            Ok(())
        } else {
            Err(RegistryError::SystemPaused)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::infrastructure::in_memory::InMemoryRegistryStore;
    use rust_decimal_macros::dec;

    const OWNER: u64 = 0x100;
    const APP: u64 = 0x200;
    const FIRST: u64 = 1;

    fn id(n: u64) -> Identity {
        Identity::from_low_u64(n)
    }

    fn ten() -> Amount {
        Amount::new(dec!(10)).unwrap()
    }

    async fn engine() -> GovernanceEngine {
        let config = RegistryConfig::default();
        let store = InMemoryRegistryStore::new(id(OWNER), id(FIRST), &config);
        let engine = GovernanceEngine::new(id(APP), Box::new(store), &config);
        engine.authorize_caller(id(OWNER), id(APP)).await.unwrap();
        engine
    }

    #[test]
    fn test_quorum_rounds_up() {
        assert_eq!(quorum(1), 1);
        assert_eq!(quorum(4), 2);
        assert_eq!(quorum(5), 3);
        assert_eq!(quorum(6), 3);
        assert_eq!(quorum(7), 4);
    }

    #[tokio::test]
    async fn test_unauthorized_engine_cannot_mutate() {
        let config = RegistryConfig::default();
        let store = InMemoryRegistryStore::new(id(OWNER), id(FIRST), &config);
        let engine = GovernanceEngine::new(id(APP), Box::new(store), &config);

        let err = engine.fund(id(FIRST), ten()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(!engine.is_funded(id(FIRST)).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_requires_funded_caller() {
        let engine = engine().await;

        let err = engine.register_airline(id(FIRST), id(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CallerNotFunded);
        assert!(!engine.is_registered_airline(id(2)).await.unwrap());
        // Rejection at the gate creates no record.
        assert!(engine.airline(id(2)).await.unwrap().is_none());

        engine.fund(id(FIRST), ten()).await.unwrap();
        let outcome = engine.register_airline(id(FIRST), id(2)).await.unwrap();
        assert_eq!(outcome, RegistrationOutcome::Registered);
        assert!(engine.is_registered_airline(id(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_funded_but_unregistered_caller_rejected() {
        let engine = engine().await;
        engine.fund(id(9), ten()).await.unwrap();

        let err = engine.register_airline(id(9), id(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CallerNotFunded);
    }

    #[tokio::test]
    async fn test_already_registered_candidate_rejected() {
        let engine = engine().await;
        engine.fund(id(FIRST), ten()).await.unwrap();
        engine.register_airline(id(FIRST), id(2)).await.unwrap();

        let err = engine.register_airline(id(FIRST), id(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyRegistered);
        assert_eq!(engine.airline_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_pending_outcome_reports_votes() {
        let engine = engine().await;
        engine.fund(id(FIRST), ten()).await.unwrap();
        for n in 2..=4 {
            engine.register_airline(id(FIRST), id(n)).await.unwrap();
        }

        let outcome = engine.register_airline(id(FIRST), id(5)).await.unwrap();
        assert_eq!(outcome, RegistrationOutcome::Pending { votes: 1, quorum: 2 });

        let record = engine.airline(id(5)).await.unwrap().unwrap();
        assert!(!record.registered);
        assert_eq!(record.vote_count(), 1);
    }

    #[tokio::test]
    async fn test_pause_blocks_business_operations() {
        let engine = engine().await;
        engine.fund(id(FIRST), ten()).await.unwrap();
        engine.set_operational(id(OWNER), false).await.unwrap();

        assert_eq!(
            engine.fund(id(FIRST), ten()).await.unwrap_err().kind(),
            ErrorKind::SystemPaused
        );
        assert_eq!(
            engine.register_airline(id(FIRST), id(2)).await.unwrap_err().kind(),
            ErrorKind::SystemPaused
        );
        assert_eq!(
            engine
                .register_flight(id(FIRST), "FL1", 1)
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::SystemPaused
        );

        engine.set_operational(id(OWNER), true).await.unwrap();
        engine.register_airline(id(FIRST), id(2)).await.unwrap();
        engine.register_flight(id(FIRST), "FL1", 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_paused_check_precedes_funding_check() {
        let engine = engine().await;
        engine.set_operational(id(OWNER), false).await.unwrap();

        // Unfunded caller, but the pause is reported first.
        let err = engine.register_airline(id(FIRST), id(2)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SystemPaused);
    }

    #[tokio::test]
    async fn test_fund_reports_crossing() {
        let engine = engine().await;
        assert!(!engine.fund(id(FIRST), Amount::new(dec!(6)).unwrap()).await.unwrap());
        assert!(engine.fund(id(FIRST), Amount::new(dec!(4)).unwrap()).await.unwrap());
        assert!(engine.fund(id(FIRST), Amount::new(dec!(1)).unwrap()).await.unwrap());

        let record = engine.airline(id(FIRST)).await.unwrap().unwrap();
        assert_eq!(record.balance.0, dec!(11));
    }

    #[tokio::test]
    async fn test_fund_overflow_is_rejected_and_processing_continues() {
        let engine = engine().await;
        let huge = Amount::new(rust_decimal::Decimal::MAX).unwrap();
        engine.fund(id(FIRST), huge).await.unwrap();

        let err = engine.fund(id(FIRST), huge).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let record = engine.airline(id(FIRST)).await.unwrap().unwrap();
        assert_eq!(record.balance.0, rust_decimal::Decimal::MAX);

        // The engine keeps serving other airlines.
        engine.register_airline(id(FIRST), id(2)).await.unwrap();
        assert!(engine.fund(id(2), ten()).await.unwrap());
    }

    #[tokio::test]
    async fn test_quorum_vote_activates_and_clears_votes_together() {
        let engine = engine().await;
        engine.fund(id(FIRST), ten()).await.unwrap();
        for n in 2..=4 {
            engine.register_airline(id(FIRST), id(n)).await.unwrap();
        }
        engine.fund(id(2), ten()).await.unwrap();

        engine.register_airline(id(FIRST), id(5)).await.unwrap();
        let outcome = engine.register_airline(id(2), id(5)).await.unwrap();
        assert_eq!(outcome, RegistrationOutcome::Registered);

        let record = engine.airline(id(5)).await.unwrap().unwrap();
        assert!(record.registered);
        assert!(record.votes.is_empty());
        assert_eq!(engine.airline_count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_register_flight_requires_eligibility() {
        let engine = engine().await;

        let err = engine.register_flight(id(FIRST), "FL1", 100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AirlineNotEligible);
        let key = FlightKey::new(id(FIRST), "FL1", 100);
        assert!(engine.flight(&key).await.unwrap().is_none());

        engine.fund(id(FIRST), ten()).await.unwrap();
        let flight = engine.register_flight(id(FIRST), "FL1", 100).await.unwrap();
        assert_eq!(flight.key(), key);
        assert_eq!(engine.flight(&key).await.unwrap(), Some(flight));

        let err = engine.register_flight(id(FIRST), "FL1", 100).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateFlight);

        // Same code at a different time is a different flight.
        engine.register_flight(id(FIRST), "FL1", 200).await.unwrap();
    }

    #[tokio::test]
    async fn test_process_operation_dispatch() {
        let engine = engine().await;
        let fund = Operation {
            r#type: OperationType::Fund,
            caller: id(FIRST),
            target: None,
            amount: Some(dec!(10)),
            flight: None,
            timestamp: None,
            mode: None,
        };
        engine.process_operation(fund).await.unwrap();
        assert!(engine.is_funded(id(FIRST)).await.unwrap());

        let register = Operation {
            r#type: OperationType::RegisterAirline,
            caller: id(FIRST),
            target: Some(id(2)),
            amount: None,
            flight: None,
            timestamp: None,
            mode: None,
        };
        engine.process_operation(register).await.unwrap();
        assert!(engine.is_registered_airline(id(2)).await.unwrap());

        let incomplete = Operation {
            r#type: OperationType::RegisterFlight,
            caller: id(FIRST),
            target: None,
            amount: None,
            flight: Some("FL1".to_string()),
            timestamp: None,
            mode: None,
        };
        let err = engine.process_operation(incomplete).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_configured_bootstrap_threshold() {
        let config = RegistryConfig {
            bootstrap_threshold: 2,
            ..RegistryConfig::default()
        };
        let store = InMemoryRegistryStore::new(id(OWNER), id(FIRST), &config);
        let engine = GovernanceEngine::new(id(APP), Box::new(store), &config);
        engine.authorize_caller(id(OWNER), id(APP)).await.unwrap();
        engine.fund(id(FIRST), ten()).await.unwrap();

        assert_eq!(
            engine.register_airline(id(FIRST), id(2)).await.unwrap(),
            RegistrationOutcome::Registered
        );
        // Two registered: quorum is one, so the sponsor's own vote suffices.
        assert_eq!(
            engine.register_airline(id(FIRST), id(3)).await.unwrap(),
            RegistrationOutcome::Registered
        );
        assert_eq!(engine.airline_count().await.unwrap(), 3);
    }
}
