//! VaultGuard will registry API.
//!
//! A stateless HTTP service over a ledger-resident digital will registry.
//! Reads reconstruct records from per-identifier contract lookups; writes are
//! prepared here, signed by the client, and broadcast back through the
//! service. Private keys never enter the process.

pub mod api;
pub mod config;
pub mod gateway;
pub mod registry;
