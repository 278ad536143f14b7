use crate::config::RegistryConfig;
use crate::domain::airline::AirlineRecord;
use crate::domain::flight::{FlightKey, FlightRecord};
use crate::domain::funds::Amount;
use crate::domain::identity::{IDENTITY_LEN, Identity};
use crate::domain::ports::RegistryStore;
use crate::error::{RegistryError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Column Family for registry-wide settings (owner, operational flag, count).
pub const CF_META: &str = "meta";
/// Column Family for authorized callers, keyed by identity.
pub const CF_CALLERS: &str = "callers";
/// Column Family for airline records, keyed by identity.
pub const CF_AIRLINES: &str = "airlines";
/// Column Family for flight records, keyed by [`FlightKey::to_storage_key`].
pub const CF_FLIGHTS: &str = "flights";

const KEY_OWNER: &[u8] = b"owner";
const KEY_OPERATIONAL: &[u8] = b"operational";
const KEY_AIRLINE_COUNT: &[u8] = b"airline_count";

/// A persistent registry store backed by RocksDB.
///
/// Each entity kind lives in its own Column Family. Mutations that touch more
/// than one key are committed through a single `WriteBatch`, and all writers
/// are serialized behind one mutex so validate-then-write is atomic.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBRegistryStore {
    db: Arc<DB>,
    writer: Arc<Mutex<()>>,
    funding_threshold: Amount,
}

impl RocksDBRegistryStore {
    /// Opens or creates a registry at `path`.
    ///
    /// A fresh database is seeded with `owner` and `first_airline`; an existing
    /// one keeps the owner and airlines it was created with.
    pub fn open<P: AsRef<Path>>(
        path: P,
        owner: Identity,
        first_airline: Identity,
        config: &RegistryConfig,
    ) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_META, CF_CALLERS, CF_AIRLINES, CF_FLIGHTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        let store = Self {
            db: Arc::new(db),
            writer: Arc::new(Mutex::new(())),
            funding_threshold: config.funding_threshold,
        };
        store.seed(owner, first_airline)?;
        Ok(store)
    }

    fn seed(&self, owner: Identity, first_airline: Identity) -> Result<()> {
        let meta = self.cf(CF_META)?;
        if self.db.get_pinned_cf(meta, KEY_OWNER)?.is_some() {
            return Ok(());
        }

        let mut first = AirlineRecord::new(first_airline);
        first.registered = true;

        let mut batch = WriteBatch::default();
        batch.put_cf(meta, KEY_OWNER, owner.as_bytes());
        batch.put_cf(meta, KEY_OPERATIONAL, [1u8]);
        batch.put_cf(meta, KEY_AIRLINE_COUNT, 1u64.to_be_bytes());
        batch.put_cf(self.cf(CF_CALLERS)?, owner.as_bytes(), [1u8]);
        batch.put_cf(
            self.cf(CF_AIRLINES)?,
            first_airline.as_bytes(),
            serde_json::to_vec(&first)?,
        );
        self.db.write(batch)?;

        info!(%owner, %first_airline, "registry seeded");
        Ok(())
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            RegistryError::InternalError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_pinned_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(
        batch: &mut WriteBatch,
        cf: &ColumnFamily,
        key: &[u8],
        value: &T,
    ) -> Result<()> {
        batch.put_cf(cf, key, serde_json::to_vec(value)?);
        Ok(())
    }

    fn load_airline(&self, airline: Identity) -> Result<Option<AirlineRecord>> {
        self.get_json(CF_AIRLINES, airline.as_bytes())
    }

    fn read_owner(&self) -> Result<Identity> {
        let bytes = self
            .db
            .get_pinned_cf(self.cf(CF_META)?, KEY_OWNER)?
            .ok_or_else(|| {
                RegistryError::InternalError(Box::new(std::io::Error::other(
                    "registry owner missing",
                )))
            })?;
        let raw = <[u8; IDENTITY_LEN]>::try_from(&bytes[..]).map_err(|_| {
            RegistryError::InternalError(Box::new(std::io::Error::other(
                "registry owner is corrupt",
            )))
        })?;
        Ok(Identity::new(raw))
    }

    fn read_count(&self) -> Result<u64> {
        let bytes = self.db.get_pinned_cf(self.cf(CF_META)?, KEY_AIRLINE_COUNT)?;
        let Some(bytes) = bytes else {
            return Ok(0);
        };
        let raw = <[u8; 8]>::try_from(&bytes[..]).map_err(|_| {
            RegistryError::InternalError(Box::new(std::io::Error::other(
                "airline count is corrupt",
            )))
        })?;
        Ok(u64::from_be_bytes(raw))
    }

    /// Loads `candidate` and applies `voter`'s vote without writing it.
    fn record_vote(&self, candidate: Identity, voter: Identity) -> Result<(AirlineRecord, usize)> {
        if !self.load_airline(voter)?.is_some_and(|v| v.registered) {
            return Err(RegistryError::UnknownVoter(voter));
        }
        let mut record = self
            .load_airline(candidate)?
            .unwrap_or_else(|| AirlineRecord::new(candidate));
        let votes = record.add_vote(voter)?;
        Ok((record, votes))
    }

    fn ensure_owner(&self, caller: Identity) -> Result<()> {
        if self.read_owner()? == caller {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized(caller))
        }
    }

    fn ensure_authorized(&self, invoker: Identity) -> Result<()> {
        if self.authorized(invoker)? {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized(invoker))
        }
    }

    fn authorized(&self, target: Identity) -> Result<bool> {
        Ok(self
            .db
            .get_pinned_cf(self.cf(CF_CALLERS)?, target.as_bytes())?
            .is_some())
    }
}

#[async_trait]
impl RegistryStore for RocksDBRegistryStore {
    async fn owner(&self) -> Result<Identity> {
        self.read_owner()
    }

    async fn set_operational(&self, caller: Identity, mode: bool) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.ensure_owner(caller)?;
        self.db
            .put_cf(self.cf(CF_META)?, KEY_OPERATIONAL, [u8::from(mode)])?;
        info!(%caller, mode, "operational status set");
        Ok(())
    }

    async fn is_operational(&self) -> Result<bool> {
        let value = self.db.get_pinned_cf(self.cf(CF_META)?, KEY_OPERATIONAL)?;
        Ok(value.is_none_or(|v| v.first() != Some(&0)))
    }

    async fn authorize_caller(&self, caller: Identity, target: Identity) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.ensure_owner(caller)?;
        self.db
            .put_cf(self.cf(CF_CALLERS)?, target.as_bytes(), [1u8])?;
        info!(%target, "caller authorized");
        Ok(())
    }

    async fn revoke_caller(&self, caller: Identity, target: Identity) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.ensure_owner(caller)?;
        self.db.delete_cf(self.cf(CF_CALLERS)?, target.as_bytes())?;
        info!(%target, "caller revoked");
        Ok(())
    }

    async fn is_authorized_caller(&self, target: Identity) -> Result<bool> {
        self.authorized(target)
    }

    async fn fund(&self, invoker: Identity, airline: Identity, amount: Amount) -> Result<bool> {
        let _guard = self.writer.lock().await;
        self.ensure_authorized(invoker)?;

        let mut record = self
            .load_airline(airline)?
            .unwrap_or_else(|| AirlineRecord::new(airline));
        let crossed = record.credit(amount, self.funding_threshold)?;

        let mut batch = WriteBatch::default();
        Self::put_json(&mut batch, self.cf(CF_AIRLINES)?, airline.as_bytes(), &record)?;
        self.db.write(batch)?;
        if crossed {
            info!(%airline, balance = %record.balance, "airline funded");
        }
        Ok(record.funded)
    }

    async fn register_airline_direct(&self, invoker: Identity, airline: Identity) -> Result<()> {
        let _guard = self.writer.lock().await;
        self.ensure_authorized(invoker)?;

        let mut record = self
            .load_airline(airline)?
            .unwrap_or_else(|| AirlineRecord::new(airline));
        record.activate()?;
        let count = self.read_count()? + 1;

        let mut batch = WriteBatch::default();
        Self::put_json(&mut batch, self.cf(CF_AIRLINES)?, airline.as_bytes(), &record)?;
        batch.put_cf(self.cf(CF_META)?, KEY_AIRLINE_COUNT, count.to_be_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    async fn cast_vote(
        &self,
        invoker: Identity,
        candidate: Identity,
        voter: Identity,
    ) -> Result<usize> {
        let _guard = self.writer.lock().await;
        self.ensure_authorized(invoker)?;

        let (record, votes) = self.record_vote(candidate, voter)?;
        let mut batch = WriteBatch::default();
        Self::put_json(&mut batch, self.cf(CF_AIRLINES)?, candidate.as_bytes(), &record)?;
        self.db.write(batch)?;
        Ok(votes)
    }

    async fn cast_vote_and_maybe_activate(
        &self,
        invoker: Identity,
        candidate: Identity,
        voter: Identity,
        quorum: usize,
    ) -> Result<usize> {
        let _guard = self.writer.lock().await;
        self.ensure_authorized(invoker)?;

        let (mut record, votes) = self.record_vote(candidate, voter)?;
        let mut batch = WriteBatch::default();
        if votes >= quorum {
            record.activate()?;
            let count = self.read_count()? + 1;
            batch.put_cf(self.cf(CF_META)?, KEY_AIRLINE_COUNT, count.to_be_bytes());
        }
        Self::put_json(&mut batch, self.cf(CF_AIRLINES)?, candidate.as_bytes(), &record)?;
        self.db.write(batch)?;
        Ok(votes)
    }

    async fn register_flight(&self, invoker: Identity, key: FlightKey) -> Result<FlightRecord> {
        let _guard = self.writer.lock().await;
        self.ensure_authorized(invoker)?;

        if !self
            .load_airline(key.airline)?
            .is_some_and(|a| a.is_eligible())
        {
            return Err(RegistryError::AirlineNotEligible(key.airline));
        }
        let storage_key = key.to_storage_key();
        let flights = self.cf(CF_FLIGHTS)?;
        if self.db.get_pinned_cf(flights, &storage_key)?.is_some() {
            return Err(RegistryError::DuplicateFlight {
                airline: key.airline,
                code: key.code,
                timestamp: key.timestamp,
            });
        }

        let record = FlightRecord::new(key);
        let mut batch = WriteBatch::default();
        Self::put_json(&mut batch, flights, &storage_key, &record)?;
        self.db.write(batch)?;
        Ok(record)
    }

    async fn airline_count(&self) -> Result<usize> {
        Ok(self.read_count()? as usize)
    }

    async fn is_registered_airline(&self, airline: Identity) -> Result<bool> {
        Ok(self.load_airline(airline)?.is_some_and(|a| a.registered))
    }

    async fn is_funded(&self, airline: Identity) -> Result<bool> {
        Ok(self.load_airline(airline)?.is_some_and(|a| a.funded))
    }

    async fn get_airline(&self, airline: Identity) -> Result<Option<AirlineRecord>> {
        self.load_airline(airline)
    }

    async fn get_flight(&self, key: &FlightKey) -> Result<Option<FlightRecord>> {
        self.get_json(CF_FLIGHTS, &key.to_storage_key())
    }

    async fn all_airlines(&self) -> Result<Vec<AirlineRecord>> {
        let mut airlines = Vec::new();
        // Keys are raw identity bytes, so iteration order is identity order.
        for item in self.db.iterator_cf(self.cf(CF_AIRLINES)?, IteratorMode::Start) {
            let (_key, value) = item?;
            airlines.push(serde_json::from_slice(&value)?);
        }
        Ok(airlines)
    }
}
