//! JSON-RPC gateway implementation over `ethers` `Provider<Http>`.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::abi::RawLog;
use ethers::providers::{Http, Middleware, Provider, ProviderError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address, BlockId, BlockNumber, Bytes, Eip1559TransactionRequest, H256, U256,
};
use tokio::time::timeout;

use super::{abi, BroadcastReceipt, FeeEstimate, GatewayError, RegistryGateway};
use crate::config::Config;
use crate::registry::RawWillRecord;

/// Gateway bound to one registry contract on one JSON-RPC endpoint.
///
/// Stateless apart from the reused HTTP connection; safe to share across
/// concurrent requests. Never retries.
pub struct EthGateway {
    provider: Provider<Http>,
    registry: Address,
    request_timeout: Duration,
    broadcast_timeout: Duration,
}

impl EthGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| anyhow!("failed to create HTTP provider: {e}"))?;
        let registry = config
            .registry_address
            .parse::<Address>()
            .context("invalid registry contract address")?;

        Ok(Self {
            provider,
            registry,
            request_timeout: config.request_timeout(),
            broadcast_timeout: config.broadcast_timeout(),
        })
    }

    /// Bound a read-path provider call with the request timeout and fold the
    /// outcome into the gateway error taxonomy.
    async fn bounded<T, F>(&self, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, ProviderError>> + Send,
    {
        match timeout(self.request_timeout, call).await {
            Err(_) => Err(GatewayError::Timeout { tx_hash: None }),
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(GatewayError::Rpc(e.to_string())),
        }
    }

    fn read_call(&self, calldata: Bytes) -> TypedTransaction {
        Eip1559TransactionRequest::new()
            .to(self.registry)
            .data(calldata)
            .into()
    }
}

/// Whether an RPC failure message is a contract revert, which on the read
/// path means the queried record does not exist.
fn is_revert(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("revert") || lower.contains("invalid token id")
}

fn not_found_on_revert(err: GatewayError) -> GatewayError {
    match err {
        GatewayError::Rpc(message) if is_revert(&message) => GatewayError::NotFound,
        other => other,
    }
}

#[async_trait]
impl RegistryGateway for EthGateway {
    fn registry_address(&self) -> Address {
        self.registry
    }

    async fn fetch_record(&self, record_id: u64) -> Result<RawWillRecord, GatewayError> {
        let call = self.read_call(abi::encode_get_will(record_id)?);
        let output = self
            .bounded(self.provider.call(&call, None))
            .await
            .map_err(not_found_on_revert)?;
        abi::decode_will_output(&output)
    }

    async fn fetch_owner(&self, record_id: u64) -> Result<Address, GatewayError> {
        let call = self.read_call(abi::encode_owner_of(record_id)?);
        let output = self
            .bounded(self.provider.call(&call, None))
            .await
            .map_err(not_found_on_revert)?;
        abi::decode_owner_output(&output)
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        let id = self.bounded(self.provider.get_chainid()).await?;
        Ok(id.as_u64())
    }

    async fn next_nonce(&self, owner: Address) -> Result<U256, GatewayError> {
        self.bounded(
            self.provider
                .get_transaction_count(owner, Some(BlockId::Number(BlockNumber::Pending))),
        )
        .await
    }

    async fn estimate_fee(&self) -> Result<FeeEstimate, GatewayError> {
        let (max_fee_per_gas, max_priority_fee_per_gas) =
            self.bounded(self.provider.estimate_eip1559_fees(None)).await?;
        Ok(FeeEstimate {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        })
    }

    async fn estimate_gas(&self, from: Address, calldata: Bytes) -> Result<U256, GatewayError> {
        let call: TypedTransaction = Eip1559TransactionRequest::new()
            .to(self.registry)
            .from(from)
            .data(calldata)
            .into();
        self.bounded(self.provider.estimate_gas(&call, None)).await
    }

    fn encode_create_call(
        &self,
        deadline: u64,
        nominees: &[Address],
        encrypted_hash: H256,
    ) -> Result<Bytes, GatewayError> {
        abi::encode_create_will(deadline, nominees, encrypted_hash)
    }

    async fn broadcast(&self, raw: Bytes) -> Result<BroadcastReceipt, GatewayError> {
        let pending = match timeout(self.request_timeout, self.provider.send_raw_transaction(raw))
            .await
        {
            Err(_) => return Err(GatewayError::Timeout { tx_hash: None }),
            Ok(Err(e)) => return Err(GatewayError::Rpc(e.to_string())),
            Ok(Ok(pending)) => pending,
        };
        let tx_hash = pending.tx_hash();
        log::info!("transaction sent: 0x{}", hex::encode(tx_hash.as_bytes()));

        // Confirmation is the longest-blocking call in the system; it runs
        // under the dedicated broadcast timeout and a timeout surfaces the
        // hash so the caller can poll on their own.
        let receipt = match timeout(self.broadcast_timeout, pending).await {
            Err(_) => {
                return Err(GatewayError::Timeout {
                    tx_hash: Some(format!("0x{}", hex::encode(tx_hash.as_bytes()))),
                })
            }
            Ok(Err(e)) => return Err(GatewayError::Rpc(e.to_string())),
            Ok(Ok(None)) => {
                return Err(GatewayError::Rpc(
                    "transaction dropped before confirmation".to_string(),
                ))
            }
            Ok(Ok(Some(receipt))) => receipt,
        };

        Ok(BroadcastReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            gas_used: receipt.gas_used,
            effective_gas_price: receipt.effective_gas_price,
            logs: receipt
                .logs
                .into_iter()
                .map(|entry| RawLog {
                    topics: entry.topics,
                    data: entry.data.to_vec(),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_messages_classify_as_not_found() {
        assert!(is_revert("execution reverted: ERC721: invalid token ID"));
        assert!(is_revert("VM Exception: revert"));
        assert!(!is_revert("connection refused"));

        let err = not_found_on_revert(GatewayError::Rpc("execution reverted".to_string()));
        assert!(matches!(err, GatewayError::NotFound));

        let err = not_found_on_revert(GatewayError::Rpc("connection refused".to_string()));
        assert!(matches!(err, GatewayError::Rpc(_)));
    }
}
