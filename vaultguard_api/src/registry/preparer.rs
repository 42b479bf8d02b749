//! Transaction preparer: builds an unsigned `createWill` descriptor for
//! client-side signing.
//!
//! Nothing here mutates network state and no key material is ever present;
//! the caller signs the returned descriptor and hands it back through the
//! submitter.

use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use super::{
    format_address, format_h256, parse_address, unix_now_millis, unix_now_secs, RegistryError,
};
use crate::config::Config;
use crate::gateway::{GatewayError, RegistryGateway};

/// Percent applied on top of a successful gas estimate.
const GAS_MARGIN_PERCENT: u64 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    pub user_address: Option<String>,
    pub nominees: Option<Vec<String>>,
    /// Offset from now, in seconds. Defaults to the configured offset.
    pub deadline_seconds: Option<i64>,
    pub encrypted_data: Option<String>,
}

/// Unsigned EIP-1559 transaction descriptor, ready for an external signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDescriptor {
    pub to: String,
    pub data: String,
    pub nonce: u64,
    pub gas_limit: String,
    pub max_fee_per_gas: String,
    pub max_priority_fee_per_gas: String,
    pub chain_id: u64,
    #[serde(rename = "type")]
    pub tx_type: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedParameters {
    pub deadline: u64,
    pub deadline_date: String,
    pub nominees: Vec<String>,
    pub encrypted_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub gas_limit: String,
    pub max_fee_per_gas: String,
    pub max_priority_fee_per_gas: String,
    pub estimated_cost_wei: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
    pub transaction_data: TransactionDescriptor,
    pub contract_address: String,
    pub function_name: String,
    pub parameters: PreparedParameters,
    pub gas_estimate: GasEstimate,
}

struct ValidatedRequest {
    owner: Address,
    nominees: Vec<Address>,
    deadline_offset: u64,
}

fn validate(request: &PrepareRequest, config: &Config) -> Result<ValidatedRequest, RegistryError> {
    let owner = match &request.user_address {
        Some(raw) if !raw.trim().is_empty() => {
            parse_address(raw, "Valid user address is required")?
        }
        _ => {
            return Err(RegistryError::InvalidArgument(
                "Valid user address is required".to_string(),
            ))
        }
    };

    let raw_nominees = match &request.nominees {
        Some(list) if !list.is_empty() => list,
        _ => {
            return Err(RegistryError::InvalidArgument(
                "Nominees array is required and must contain at least one address".to_string(),
            ))
        }
    };
    let mut nominees = Vec::with_capacity(raw_nominees.len());
    for nominee in raw_nominees {
        nominees.push(parse_address(
            nominee,
            format!("Invalid nominee address: {nominee}"),
        )?);
    }

    let deadline_offset = match request.deadline_seconds {
        None => config.default_deadline_offset_secs,
        Some(seconds) if seconds > 0 => seconds as u64,
        Some(_) => {
            return Err(RegistryError::InvalidArgument(
                "Deadline offset must be a positive number of seconds".to_string(),
            ))
        }
    };
    if let Some(max) = config.max_deadline_offset_secs {
        if deadline_offset > max {
            return Err(RegistryError::InvalidArgument(format!(
                "Deadline offset exceeds the configured maximum of {max} seconds"
            )));
        }
    }

    Ok(ValidatedRequest {
        owner,
        nominees,
        deadline_offset,
    })
}

/// Derive the content hash bound into the will. Without a payload a
/// placeholder is hashed so the demo path stays functional; that hash has no
/// cryptographic meaning for identity binding and is logged as such.
fn content_hash(encrypted_data: Option<&str>) -> H256 {
    match encrypted_data {
        Some(data) if !data.is_empty() => H256::from(keccak256(data.as_bytes())),
        _ => {
            log::warn!("no encrypted payload supplied, hashing a generated placeholder");
            let placeholder = format!("default-encrypted-data-{}", unix_now_millis());
            H256::from(keccak256(placeholder.as_bytes()))
        }
    }
}

fn remote(context: &'static str) -> impl FnOnce(GatewayError) -> RegistryError {
    move |err| RegistryError::remote(format!("{context}: {err}"))
}

/// Build an unsigned `createWill` transaction descriptor.
///
/// All local validation happens before the first gateway call; any remote
/// failure aborts the whole preparation (partial descriptors have no
/// meaning), except gas estimation, which falls back to the configured
/// default limit.
pub async fn prepare(
    gateway: &dyn RegistryGateway,
    config: &Config,
    request: &PrepareRequest,
) -> Result<PreparedTransaction, RegistryError> {
    let validated = validate(request, config)?;

    let deadline = unix_now_secs() + validated.deadline_offset;
    let encrypted_hash = content_hash(request.encrypted_data.as_deref());

    let chain_id = gateway
        .chain_id()
        .await
        .map_err(remote("failed to fetch chain id"))?;
    let nonce = gateway
        .next_nonce(validated.owner)
        .await
        .map_err(remote("failed to fetch pending nonce"))?;
    let fees = gateway
        .estimate_fee()
        .await
        .map_err(remote("failed to fetch fee data"))?;

    let calldata = gateway
        .encode_create_call(deadline, &validated.nominees, encrypted_hash)
        .map_err(remote("failed to encode call data"))?;

    let gas_limit = match gateway.estimate_gas(validated.owner, calldata.clone()).await {
        Ok(raw) => raw.saturating_mul(U256::from(100 + GAS_MARGIN_PERCENT)) / U256::from(100),
        Err(err) => {
            log::warn!("gas estimation failed, using default: {err}");
            U256::from(config.default_gas_limit)
        }
    };

    let estimated_cost_wei = gas_limit.saturating_mul(fees.max_fee_per_gas);

    Ok(PreparedTransaction {
        transaction_data: TransactionDescriptor {
            to: format_address(&gateway.registry_address()),
            data: format!("0x{}", hex::encode(&calldata)),
            nonce: nonce.as_u64(),
            gas_limit: gas_limit.to_string(),
            max_fee_per_gas: fees.max_fee_per_gas.to_string(),
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas.to_string(),
            chain_id,
            tx_type: 2,
        },
        contract_address: format_address(&gateway.registry_address()),
        function_name: "createWill".to_string(),
        parameters: PreparedParameters {
            deadline,
            deadline_date: chrono::DateTime::<chrono::Utc>::from_timestamp(deadline as i64, 0)
                .map(|date| date.to_rfc3339())
                .unwrap_or_default(),
            nominees: validated.nominees.iter().map(format_address).collect(),
            encrypted_hash: format_h256(&encrypted_hash),
        },
        gas_estimate: GasEstimate {
            gas_limit: gas_limit.to_string(),
            max_fee_per_gas: fees.max_fee_per_gas.to_string(),
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas.to_string(),
            estimated_cost_wei: estimated_cost_wei.to_string(),
        },
    })
}
