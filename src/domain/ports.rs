use super::airline::AirlineRecord;
use super::flight::{FlightKey, FlightRecord};
use super::funds::Amount;
use super::identity::Identity;
use crate::error::Result;
use async_trait::async_trait;

/// The authoritative ledger behind the registry.
///
/// Implementations hold all mutable state and enforce only structural rules
/// (owner-only administration, caller authorization, duplicate votes and
/// flights). Every method is all-or-nothing: on error, nothing changed.
///
/// `invoker` is the identity of the component issuing a business mutation and
/// must have been authorized by the owner. `caller` on administrative methods
/// must be the owner.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn owner(&self) -> Result<Identity>;

    async fn set_operational(&self, caller: Identity, mode: bool) -> Result<()>;
    async fn is_operational(&self) -> Result<bool>;

    async fn authorize_caller(&self, caller: Identity, target: Identity) -> Result<()>;
    async fn revoke_caller(&self, caller: Identity, target: Identity) -> Result<()>;
    async fn is_authorized_caller(&self, target: Identity) -> Result<bool>;

    /// Credits `amount` to `airline`, returning whether it is now funded.
    async fn fund(&self, invoker: Identity, airline: Identity, amount: Amount) -> Result<bool>;

    /// Marks `airline` registered, creating its record if needed.
    async fn register_airline_direct(&self, invoker: Identity, airline: Identity) -> Result<()>;

    /// Adds `voter` to the votes for `candidate`, returning the distinct vote count.
    async fn cast_vote(&self, invoker: Identity, candidate: Identity, voter: Identity)
    -> Result<usize>;

    /// Casts `voter`'s vote for `candidate` and registers the candidate in the
    /// same atomic write once distinct votes reach `quorum`. Returns the
    /// distinct vote count including this vote.
    async fn cast_vote_and_maybe_activate(
        &self,
        invoker: Identity,
        candidate: Identity,
        voter: Identity,
        quorum: usize,
    ) -> Result<usize>;

    async fn register_flight(&self, invoker: Identity, key: FlightKey) -> Result<FlightRecord>;

    async fn airline_count(&self) -> Result<usize>;
    async fn is_registered_airline(&self, airline: Identity) -> Result<bool>;
    async fn is_funded(&self, airline: Identity) -> Result<bool>;
    async fn get_airline(&self, airline: Identity) -> Result<Option<AirlineRecord>>;
    async fn get_flight(&self, key: &FlightKey) -> Result<Option<FlightRecord>>;
    async fn all_airlines(&self) -> Result<Vec<AirlineRecord>>;
}

pub type RegistryStoreBox = Box<dyn RegistryStore>;
