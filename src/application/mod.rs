//! Application layer containing the registry governance rules.
//!
//! This module defines the `GovernanceEngine`, the entry point for every
//! registry operation. It serializes mutations behind a single gate so that
//! a vote and the activation it may trigger are applied as one step.

pub mod engine;
