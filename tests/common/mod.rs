#![allow(dead_code)]

use flightsurety::application::engine::GovernanceEngine;
use flightsurety::config::RegistryConfig;
use flightsurety::domain::funds::Amount;
use flightsurety::domain::identity::Identity;
use flightsurety::infrastructure::in_memory::InMemoryRegistryStore;
use rust_decimal::Decimal;
use std::io::{Error, Write};
use tempfile::NamedTempFile;

pub const OWNER: u64 = 0x100;
pub const APP: u64 = 0x200;
pub const FIRST_AIRLINE: u64 = 1;

pub const HEADER: &str = "type, caller, target, amount, flight, timestamp, mode";

pub fn id(n: u64) -> Identity {
    Identity::from_low_u64(n)
}

pub fn ether(units: u32) -> Amount {
    Amount::new(Decimal::from(units)).expect("positive amount")
}

/// An engine over a fresh in-memory store, authorized by the owner.
pub async fn engine() -> GovernanceEngine {
    engine_with(RegistryConfig::default()).await
}

pub async fn engine_with(config: RegistryConfig) -> GovernanceEngine {
    let store = InMemoryRegistryStore::new(id(OWNER), id(FIRST_AIRLINE), &config);
    let engine = GovernanceEngine::new(id(APP), Box::new(store), &config);
    engine
        .authorize_caller(id(OWNER), id(APP))
        .await
        .expect("owner authorizes the engine");
    engine
}

/// An engine with airlines `1..=count` registered and funded.
pub async fn funded_network(count: u64) -> GovernanceEngine {
    let engine = engine().await;
    engine.fund(id(FIRST_AIRLINE), ether(10)).await.unwrap();
    for n in 2..=count {
        engine.register_airline(id(FIRST_AIRLINE), id(n)).await.unwrap();
        engine.fund(id(n), ether(10)).await.unwrap();
    }
    engine
}

/// Writes an operations CSV with the standard header and the given rows.
pub fn operations_file(rows: &[String]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "{}", HEADER)?;
    for row in rows {
        writeln!(file, "{}", row)?;
    }
    file.flush()?;
    Ok(file)
}

pub fn fund_row(caller: u64, amount: &str) -> String {
    format!("fund, {}, , {}, , ,", id(caller), amount)
}

pub fn register_row(caller: u64, candidate: u64) -> String {
    format!("register_airline, {}, {}, , , ,", id(caller), id(candidate))
}

pub fn flight_row(caller: u64, code: &str, timestamp: u64) -> String {
    format!("register_flight, {}, , , {}, {},", id(caller), code, timestamp)
}

pub fn operational_row(caller: u64, mode: bool) -> String {
    format!("set_operational, {}, , , , , {}", id(caller), mode)
}
