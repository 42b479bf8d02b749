//! Transaction submitter: broadcasts a client-signed payload and reports the
//! confirmed outcome, including the identifier of a newly created record.

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::Address;
use ethers::utils::rlp::Rlp;
use serde::{Deserialize, Serialize};

use super::{format_address, RegistryError};
use crate::gateway::{abi, GatewayError, RegistryGateway};

/// Confirmed outcome of a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
    /// Identifier of the created record, mined out of the confirmation's
    /// event logs. `None` when no creation event was emitted — a valid,
    /// reportable outcome.
    pub token_id: Option<u64>,
    pub gas_used: Option<String>,
    pub gas_price: Option<String>,
    pub contract_address: String,
    pub from: String,
}

/// Recover the sender locally from the signed payload; no network round trip.
fn decode_sender(raw: &[u8]) -> Result<Address, RegistryError> {
    let rlp = Rlp::new(raw);
    let (transaction, signature) = TypedTransaction::decode_signed(&rlp).map_err(|e| {
        RegistryError::InvalidArgument(format!("Signed transaction could not be decoded: {e}"))
    })?;
    signature.recover(transaction.sighash()).map_err(|e| {
        RegistryError::InvalidArgument(format!(
            "Signed transaction signature recovery failed: {e}"
        ))
    })
}

/// Classify a broadcast failure into the domain taxonomy. Known ledger
/// rejections are pattern-matched out of the node's message; everything else
/// stays a remote failure carrying the hash when one was obtained.
fn classify_broadcast_failure(err: GatewayError) -> RegistryError {
    match err {
        GatewayError::Timeout { tx_hash } => RegistryError::RemoteUnavailable {
            details: "timed out awaiting confirmation".to_string(),
            tx_hash,
        },
        GatewayError::Rpc(message) => {
            let lower = message.to_lowercase();
            if lower.contains("insufficient funds") {
                RegistryError::InsufficientFunds(message)
            } else if lower.contains("nonce too low") || lower.contains("nonce too high") {
                RegistryError::InvalidNonce(message)
            } else {
                RegistryError::remote(message)
            }
        }
        other => RegistryError::remote(other.to_string()),
    }
}

/// Broadcast a signed transaction and wait for confirmation.
///
/// The payload is validated and the sender recovered before the gateway is
/// contacted; broadcast failures are classified per the error taxonomy. The
/// service never retries a broadcast.
pub async fn submit(
    gateway: &dyn RegistryGateway,
    signed_transaction: &str,
) -> Result<SubmissionResult, RegistryError> {
    let trimmed = signed_transaction.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::InvalidArgument(
            "Signed transaction is required".to_string(),
        ));
    }

    let raw = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed)).map_err(|_| {
        RegistryError::InvalidArgument("Signed transaction is not valid hex".to_string())
    })?;
    let from = decode_sender(&raw)?;

    let receipt = gateway
        .broadcast(raw.into())
        .await
        .map_err(classify_broadcast_failure)?;

    let token_id = abi::record_id_from_logs(&receipt.logs);
    if token_id.is_none() {
        log::info!(
            "confirmation for 0x{} carried no creation event",
            hex::encode(receipt.tx_hash.as_bytes())
        );
    }

    Ok(SubmissionResult {
        transaction_hash: format!("0x{}", hex::encode(receipt.tx_hash.as_bytes())),
        block_number: receipt.block_number,
        token_id,
        gas_used: receipt.gas_used.map(|gas| gas.to_string()),
        gas_price: receipt.effective_gas_price.map(|price| price.to_string()),
        contract_address: format_address(&gateway.registry_address()),
        from: format_address(&from),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{BroadcastReceipt, FeeEstimate};
    use crate::registry::RawWillRecord;
    use async_trait::async_trait;
    use ethers::abi::RawLog;
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::{Bytes, Eip1559TransactionRequest, H256, U256};
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicU64, Ordering};

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    struct FakeBroadcaster {
        outcome: Result<BroadcastReceipt, GatewayError>,
        broadcasts: AtomicU64,
    }

    impl FakeBroadcaster {
        fn new(outcome: Result<BroadcastReceipt, GatewayError>) -> Self {
            Self {
                outcome,
                broadcasts: AtomicU64::new(0),
            }
        }

        fn broadcasts(&self) -> u64 {
            self.broadcasts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RegistryGateway for FakeBroadcaster {
        fn registry_address(&self) -> Address {
            "0x141fa614e6b3a24e8076777b56e22a447d156884"
                .parse()
                .unwrap()
        }

        async fn fetch_record(&self, _record_id: u64) -> Result<RawWillRecord, GatewayError> {
            Err(GatewayError::NotFound)
        }

        async fn fetch_owner(&self, _record_id: u64) -> Result<Address, GatewayError> {
            Err(GatewayError::NotFound)
        }

        async fn chain_id(&self) -> Result<u64, GatewayError> {
            Ok(11155111)
        }

        async fn next_nonce(&self, _owner: Address) -> Result<U256, GatewayError> {
            Ok(U256::zero())
        }

        async fn estimate_fee(&self) -> Result<FeeEstimate, GatewayError> {
            Err(GatewayError::Rpc("unused".to_string()))
        }

        async fn estimate_gas(&self, _from: Address, _calldata: Bytes) -> Result<U256, GatewayError> {
            Err(GatewayError::Rpc("unused".to_string()))
        }

        fn encode_create_call(
            &self,
            _deadline: u64,
            _nominees: &[Address],
            _encrypted_hash: H256,
        ) -> Result<Bytes, GatewayError> {
            Ok(Bytes::new())
        }

        async fn broadcast(&self, _raw: Bytes) -> Result<BroadcastReceipt, GatewayError> {
            self.broadcasts.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn receipt_with_logs(logs: Vec<RawLog>) -> BroadcastReceipt {
        BroadcastReceipt {
            tx_hash: H256::from_low_u64_be(0xbeef),
            block_number: Some(123),
            gas_used: Some(U256::from(90_000u64)),
            effective_gas_price: Some(U256::from(30_000_000_000u64)),
            logs,
        }
    }

    /// A real signed EIP-1559 payload plus the signing address.
    fn signed_payload() -> (String, Address) {
        let wallet: LocalWallet = TEST_KEY.parse().unwrap();
        let wallet = wallet.with_chain_id(11155111u64);
        let tx: TypedTransaction = Eip1559TransactionRequest::new()
            .to("0x141fa614e6b3a24e8076777b56e22a447d156884"
                .parse::<Address>()
                .unwrap())
            .chain_id(11155111u64)
            .nonce(0u64)
            .gas(100_000u64)
            .max_fee_per_gas(40_000_000_000u64)
            .max_priority_fee_per_gas(1_500_000_000u64)
            .into();
        let signature = wallet.sign_transaction_sync(&tx).unwrap();
        let raw = tx.rlp_signed(&signature);
        (format!("0x{}", hex::encode(&raw)), wallet.address())
    }

    fn transfer_log(token_id: u64) -> RawLog {
        let mut to_topic = [0u8; 32];
        to_topic[12..].copy_from_slice(Address::from_low_u64_be(5).as_bytes());
        RawLog {
            topics: vec![
                crate::gateway::abi::event_signature("Transfer").unwrap(),
                H256::zero(),
                H256::from(to_topic),
                H256::from_low_u64_be(token_id),
            ],
            data: Vec::new(),
        }
    }

    #[test]
    fn empty_payload_fails_before_any_broadcast() {
        let gateway = FakeBroadcaster::new(Ok(receipt_with_logs(vec![])));
        for payload in ["", "   "] {
            let err = block_on(submit(&gateway, payload)).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidArgument(_)));
        }
        assert_eq!(gateway.broadcasts(), 0);
    }

    #[test]
    fn non_hex_payload_fails_before_any_broadcast() {
        let gateway = FakeBroadcaster::new(Ok(receipt_with_logs(vec![])));
        let err = block_on(submit(&gateway, "0xzzzz")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)));
        assert_eq!(gateway.broadcasts(), 0);
    }

    #[test]
    fn undecodable_payload_fails_before_any_broadcast() {
        let gateway = FakeBroadcaster::new(Ok(receipt_with_logs(vec![])));
        let err = block_on(submit(&gateway, "0xdeadbeef")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)));
        assert_eq!(gateway.broadcasts(), 0);
    }

    #[test]
    fn sender_is_recovered_from_the_payload() {
        let (payload, signer) = signed_payload();
        let gateway = FakeBroadcaster::new(Ok(receipt_with_logs(vec![transfer_log(42)])));
        let result = block_on(submit(&gateway, &payload)).unwrap();

        assert_eq!(result.from, format_address(&signer));
        assert_eq!(result.token_id, Some(42));
        assert_eq!(result.block_number, Some(123));
        assert_eq!(result.gas_used.as_deref(), Some("90000"));
    }

    #[test]
    fn missing_creation_event_reports_null_token_id() {
        let (payload, _) = signed_payload();
        let gateway = FakeBroadcaster::new(Ok(receipt_with_logs(vec![])));
        let result = block_on(submit(&gateway, &payload)).unwrap();
        assert!(result.token_id.is_none());
    }

    #[test]
    fn insufficient_funds_is_classified() {
        let (payload, _) = signed_payload();
        let gateway = FakeBroadcaster::new(Err(GatewayError::Rpc(
            "insufficient funds for gas * price + value".to_string(),
        )));
        let err = block_on(submit(&gateway, &payload)).unwrap_err();
        assert!(matches!(err, RegistryError::InsufficientFunds(_)));
    }

    #[test]
    fn nonce_conflicts_are_classified() {
        let (payload, _) = signed_payload();
        for message in ["nonce too low", "Nonce too HIGH: expected 4"] {
            let gateway = FakeBroadcaster::new(Err(GatewayError::Rpc(message.to_string())));
            let err = block_on(submit(&gateway, &payload)).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidNonce(_)));
        }
    }

    #[test]
    fn confirmation_timeout_surfaces_the_transaction_hash() {
        let (payload, _) = signed_payload();
        let gateway = FakeBroadcaster::new(Err(GatewayError::Timeout {
            tx_hash: Some("0xabc123".to_string()),
        }));
        let err = block_on(submit(&gateway, &payload)).unwrap_err();
        match err {
            RegistryError::RemoteUnavailable { tx_hash, .. } => {
                assert_eq!(tx_hash.as_deref(), Some("0xabc123"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unclassified_failures_stay_remote() {
        let (payload, _) = signed_payload();
        let gateway = FakeBroadcaster::new(Err(GatewayError::Rpc("connection reset".to_string())));
        let err = block_on(submit(&gateway, &payload)).unwrap_err();
        assert!(matches!(err, RegistryError::RemoteUnavailable { .. }));
    }
}
