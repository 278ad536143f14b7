use crate::config::RegistryConfig;
use crate::domain::airline::AirlineRecord;
use crate::domain::flight::{FlightKey, FlightRecord};
use crate::domain::funds::Amount;
use crate::domain::identity::Identity;
use crate::domain::ports::RegistryStore;
use crate::domain::registry::RegistryState;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A thread-safe in-memory registry store.
///
/// Uses `Arc<RwLock<RegistryState>>`: reads share the lock, every write holds
/// it exclusively for the whole validate-then-apply step.
#[derive(Clone)]
pub struct InMemoryRegistryStore {
    state: Arc<RwLock<RegistryState>>,
}

impl InMemoryRegistryStore {
    /// Creates a store owned by `owner`, seeded with `first_airline` as the
    /// only registered airline.
    pub fn new(owner: Identity, first_airline: Identity, config: &RegistryConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState::new(
                owner,
                first_airline,
                config.funding_threshold,
            ))),
        }
    }
}

#[async_trait]
impl RegistryStore for InMemoryRegistryStore {
    async fn owner(&self) -> Result<Identity> {
        Ok(self.state.read().await.owner())
    }

    async fn set_operational(&self, caller: Identity, mode: bool) -> Result<()> {
        self.state.write().await.set_operational(caller, mode)?;
        info!(%caller, mode, "operational status set");
        Ok(())
    }

    async fn is_operational(&self) -> Result<bool> {
        Ok(self.state.read().await.is_operational())
    }

    async fn authorize_caller(&self, caller: Identity, target: Identity) -> Result<()> {
        self.state.write().await.authorize_caller(caller, target)?;
        info!(%target, "caller authorized");
        Ok(())
    }

    async fn revoke_caller(&self, caller: Identity, target: Identity) -> Result<()> {
        self.state.write().await.revoke_caller(caller, target)?;
        info!(%target, "caller revoked");
        Ok(())
    }

    async fn is_authorized_caller(&self, target: Identity) -> Result<bool> {
        Ok(self.state.read().await.is_authorized_caller(target))
    }

    async fn fund(&self, invoker: Identity, airline: Identity, amount: Amount) -> Result<bool> {
        self.state.write().await.fund(invoker, airline, amount)
    }

    async fn register_airline_direct(&self, invoker: Identity, airline: Identity) -> Result<()> {
        self.state
            .write()
            .await
            .register_airline_direct(invoker, airline)
    }

    async fn cast_vote(
        &self,
        invoker: Identity,
        candidate: Identity,
        voter: Identity,
    ) -> Result<usize> {
        self.state.write().await.cast_vote(invoker, candidate, voter)
    }

    async fn cast_vote_and_maybe_activate(
        &self,
        invoker: Identity,
        candidate: Identity,
        voter: Identity,
        quorum: usize,
    ) -> Result<usize> {
        self.state
            .write()
            .await
            .cast_vote_and_maybe_activate(invoker, candidate, voter, quorum)
    }

    async fn register_flight(&self, invoker: Identity, key: FlightKey) -> Result<FlightRecord> {
        self.state.write().await.register_flight(invoker, key)
    }

    async fn airline_count(&self) -> Result<usize> {
        Ok(self.state.read().await.airline_count())
    }

    async fn is_registered_airline(&self, airline: Identity) -> Result<bool> {
        Ok(self.state.read().await.is_registered_airline(airline))
    }

    async fn is_funded(&self, airline: Identity) -> Result<bool> {
        Ok(self.state.read().await.is_funded(airline))
    }

    async fn get_airline(&self, airline: Identity) -> Result<Option<AirlineRecord>> {
        Ok(self.state.read().await.airline(airline).cloned())
    }

    async fn get_flight(&self, key: &FlightKey) -> Result<Option<FlightRecord>> {
        Ok(self.state.read().await.flight(key).cloned())
    }

    async fn all_airlines(&self) -> Result<Vec<AirlineRecord>> {
        let state = self.state.read().await;
        let mut airlines: Vec<AirlineRecord> = state.airlines().cloned().collect();
        airlines.sort_by_key(|a| a.airline);
        Ok(airlines)
    }
}
