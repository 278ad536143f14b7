//! Registry entities and the storage port they are persisted through.

pub mod airline;
pub mod flight;
pub mod funds;
pub mod identity;
pub mod operation;
pub mod ports;
pub mod registry;
