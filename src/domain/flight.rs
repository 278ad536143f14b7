use super::identity::Identity;
use serde::{Deserialize, Serialize};

/// Uniquely identifies a flight: the operating airline, its code and the
/// scheduled departure timestamp (seconds since the Unix epoch).
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone)]
pub struct FlightKey {
    pub airline: Identity,
    pub code: String,
    pub timestamp: u64,
}

impl FlightKey {
    pub fn new(airline: Identity, code: impl Into<String>, timestamp: u64) -> Self {
        Self {
            airline,
            code: code.into(),
            timestamp,
        }
    }

    /// Byte encoding used as a storage key: airline, timestamp, then code.
    pub fn to_storage_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(20 + 8 + self.code.len());
        key.extend_from_slice(self.airline.as_bytes());
        key.extend_from_slice(&self.timestamp.to_be_bytes());
        key.extend_from_slice(self.code.as_bytes());
        key
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct FlightRecord {
    pub airline: Identity,
    pub code: String,
    pub timestamp: u64,
    pub registered: bool,
}

impl FlightRecord {
    pub fn new(key: FlightKey) -> Self {
        Self {
            airline: key.airline,
            code: key.code,
            timestamp: key.timestamp,
            registered: true,
        }
    }

    pub fn key(&self) -> FlightKey {
        FlightKey::new(self.airline, self.code.clone(), self.timestamp)
    }
}
