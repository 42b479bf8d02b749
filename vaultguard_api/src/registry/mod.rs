//! Domain model and operations for the will registry.
//!
//! The registry itself lives on the ledger; every type here is reconstructed
//! from contract state on each request and never persisted by this service.

pub mod formatter;
pub mod preparer;
pub mod scanner;
pub mod submitter;

use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// A genuine record always carries a deadline at or above this floor; a
/// zero-valued or sub-floor deadline marks an empty slot rather than a will.
pub const WILL_DEADLINE_FLOOR: u64 = 1_000_000_000;

/// Decoded `getWill(uint256)` tuple, exactly as the contract returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWillRecord {
    pub deadline: u64,
    pub triggered: bool,
    pub nominees: Vec<Address>,
    pub encrypted_hash: H256,
    pub decrypted_hash: H256,
    pub executed: bool,
}

impl RawWillRecord {
    /// Whether the tuple describes a real will rather than an empty slot.
    pub fn is_valid_will(&self) -> bool {
        self.deadline >= WILL_DEADLINE_FLOOR
    }
}

/// Deadline of a will, as a Unix timestamp plus an ISO-8601 rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WillDeadline {
    pub timestamp: u64,
    pub date: String,
}

/// Derived status flags; computed on read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WillStatus {
    pub is_active: bool,
    pub is_triggered: bool,
    pub is_executed: bool,
    pub deadline_passed: bool,
}

/// Read model of a single will record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Will {
    pub record_id: u64,
    /// Owner address; absent when the owner lookup failed independently of
    /// the record itself.
    pub owner: Option<String>,
    pub deadline: WillDeadline,
    pub triggered: bool,
    pub executed: bool,
    pub nominees: Vec<String>,
    pub encrypted_hash: String,
    pub decrypted_hash: String,
    pub status: WillStatus,
}

/// Error taxonomy for registry operations.
///
/// `InvalidArgument` is always raised before any ledger call; the remaining
/// variants classify ledger outcomes. Raw transport errors never escape this
/// layer.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("record does not exist on the ledger")]
    NotFound,
    #[error("insufficient funds to pay for gas fees")]
    InsufficientFunds(String),
    #[error("invalid transaction nonce")]
    InvalidNonce(String),
    #[error("ledger node unavailable: {details}")]
    RemoteUnavailable {
        details: String,
        /// Hash of the broadcast transaction when one was obtained before the
        /// failure, so the caller can poll for it independently.
        tx_hash: Option<String>,
    },
}

impl RegistryError {
    pub fn remote(details: impl Into<String>) -> Self {
        Self::RemoteUnavailable {
            details: details.into(),
            tx_hash: None,
        }
    }
}

/// Parse an EVM address, mapping failure to `InvalidArgument` with the given
/// message. Accepts any hex casing; comparison downstream is on the parsed
/// bytes, so matching is case-insensitive by construction.
pub fn parse_address(value: &str, error_message: impl Into<String>) -> Result<Address, RegistryError> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|_| RegistryError::InvalidArgument(error_message.into()))
}

/// Current Unix time in seconds.
pub fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Current Unix time in milliseconds.
pub fn unix_now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Render an address with the canonical lowercase `0x` prefix.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// Render a 32-byte hash with the `0x` prefix.
pub fn format_h256(hash: &H256) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}
