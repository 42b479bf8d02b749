//! Ledger gateway: the only place that talks to the remote node.
//!
//! The rest of the crate depends on the [`RegistryGateway`] capability trait,
//! never on a concrete transport. That keeps the discovery scanner's probing
//! strategy replaceable (an indexed event-log reader satisfies the same
//! trait) and makes every component testable against an in-memory double.
//!
//! The gateway carries no policy: it decodes, classifies transport failures,
//! and bounds each call with a timeout. Retry decisions belong to callers.

pub mod abi;
pub mod eth;

use async_trait::async_trait;
use ethers::abi::RawLog;
use ethers::types::{Address, Bytes, H256, U256};
use thiserror::Error;

use crate::registry::RawWillRecord;

pub use eth::EthGateway;

/// Failure classification at the transport boundary.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The ledger confirms the requested record does not exist.
    #[error("record not found on ledger")]
    NotFound,
    /// The call exceeded its timeout. Carries the transaction hash when the
    /// broadcast was accepted before confirmation timed out.
    #[error("ledger call timed out")]
    Timeout { tx_hash: Option<String> },
    /// ABI encoding or decoding failed; the remote payload did not match the
    /// registry contract surface.
    #[error("abi codec error: {0}")]
    Codec(String),
    /// Any other remote failure, with the node's message preserved for
    /// classification by the caller.
    #[error("ledger rpc error: {0}")]
    Rpc(String),
}

/// EIP-1559 fee estimate from the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

/// Confirmation data for a broadcast transaction.
#[derive(Debug, Clone)]
pub struct BroadcastReceipt {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub effective_gas_price: Option<U256>,
    pub logs: Vec<RawLog>,
}

/// Read and write capabilities against the will registry contract.
#[async_trait]
pub trait RegistryGateway: Send + Sync {
    /// Address of the registry contract this gateway is bound to.
    fn registry_address(&self) -> Address;

    /// Fetch the raw will tuple for a record id. `NotFound` when the ledger
    /// reports the record does not exist.
    async fn fetch_record(&self, record_id: u64) -> Result<RawWillRecord, GatewayError>;

    /// Resolve the owner of a record id.
    async fn fetch_owner(&self, record_id: u64) -> Result<Address, GatewayError>;

    /// Network chain identifier.
    async fn chain_id(&self) -> Result<u64, GatewayError>;

    /// Next pending nonce for an address.
    async fn next_nonce(&self, owner: Address) -> Result<U256, GatewayError>;

    /// Current EIP-1559 fee data.
    async fn estimate_fee(&self) -> Result<FeeEstimate, GatewayError>;

    /// Gas estimate for calling the registry with `calldata` from `from`.
    async fn estimate_gas(&self, from: Address, calldata: Bytes) -> Result<U256, GatewayError>;

    /// Encode a `createWill` call. Pure; performs no I/O.
    fn encode_create_call(
        &self,
        deadline: u64,
        nominees: &[Address],
        encrypted_hash: H256,
    ) -> Result<Bytes, GatewayError>;

    /// Broadcast a signed transaction and block until the network confirms it
    /// or the broadcast timeout elapses.
    async fn broadcast(&self, raw: Bytes) -> Result<BroadcastReceipt, GatewayError>;
}
