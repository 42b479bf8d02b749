//! Registry contract ABI and codec helpers.
//!
//! The contract surface is small enough to declare inline in human-readable
//! form. Decoding of the `getWill` tuple is defensive: a field of the wrong
//! shape becomes zero/empty and the scanner's validity floor rejects the
//! record, rather than the whole request failing.

use ethers::abi::{parse_abi, Abi, RawLog, Token};
use ethers::types::{Address, Bytes, H256, U256};
use once_cell::sync::Lazy;

use super::GatewayError;
use crate::registry::RawWillRecord;

static REGISTRY_ABI: Lazy<Abi> = Lazy::new(|| {
    parse_abi(&[
        "function getWill(uint256 tokenId) view returns (uint256, bool, address[], bytes32, bytes32, bool)",
        "function ownerOf(uint256 tokenId) view returns (address)",
        "function createWill(uint256 deadline, address[] nominees, bytes32 encryptedHash)",
        "event Transfer(address indexed from, address indexed to, uint256 indexed tokenId)",
        "event WillCreated(uint256 indexed tokenId, address indexed owner, uint256 deadline)",
    ])
    .expect("registry abi is statically valid")
});

/// Creation events carrying the new record id, in scan priority order.
const CREATION_EVENTS: [&str; 2] = ["Transfer", "WillCreated"];

fn codec_error(context: &str, err: impl std::fmt::Display) -> GatewayError {
    GatewayError::Codec(format!("{context}: {err}"))
}

/// Calldata for `getWill(recordId)`.
pub fn encode_get_will(record_id: u64) -> Result<Bytes, GatewayError> {
    let function = REGISTRY_ABI
        .function("getWill")
        .map_err(|e| codec_error("getWill lookup", e))?;
    let data = function
        .encode_input(&[Token::Uint(U256::from(record_id))])
        .map_err(|e| codec_error("getWill encoding", e))?;
    Ok(data.into())
}

/// Calldata for `ownerOf(recordId)`.
pub fn encode_owner_of(record_id: u64) -> Result<Bytes, GatewayError> {
    let function = REGISTRY_ABI
        .function("ownerOf")
        .map_err(|e| codec_error("ownerOf lookup", e))?;
    let data = function
        .encode_input(&[Token::Uint(U256::from(record_id))])
        .map_err(|e| codec_error("ownerOf encoding", e))?;
    Ok(data.into())
}

/// Calldata for `createWill(deadline, nominees, encryptedHash)`.
pub fn encode_create_will(
    deadline: u64,
    nominees: &[Address],
    encrypted_hash: H256,
) -> Result<Bytes, GatewayError> {
    let function = REGISTRY_ABI
        .function("createWill")
        .map_err(|e| codec_error("createWill lookup", e))?;
    let nominee_tokens = nominees.iter().map(|a| Token::Address(*a)).collect();
    let data = function
        .encode_input(&[
            Token::Uint(U256::from(deadline)),
            Token::Array(nominee_tokens),
            Token::FixedBytes(encrypted_hash.as_bytes().to_vec()),
        ])
        .map_err(|e| codec_error("createWill encoding", e))?;
    Ok(data.into())
}

/// Decode the raw `getWill` return data into a [`RawWillRecord`].
pub fn decode_will_output(output: &[u8]) -> Result<RawWillRecord, GatewayError> {
    let function = REGISTRY_ABI
        .function("getWill")
        .map_err(|e| codec_error("getWill lookup", e))?;
    let tokens = function
        .decode_output(output)
        .map_err(|e| codec_error("getWill decoding", e))?;

    Ok(RawWillRecord {
        deadline: token_u64(tokens.first()),
        triggered: token_bool(tokens.get(1)),
        nominees: token_addresses(tokens.get(2)),
        encrypted_hash: token_h256(tokens.get(3)),
        decrypted_hash: token_h256(tokens.get(4)),
        executed: token_bool(tokens.get(5)),
    })
}

/// Decode the `ownerOf` return data.
pub fn decode_owner_output(output: &[u8]) -> Result<Address, GatewayError> {
    let function = REGISTRY_ABI
        .function("ownerOf")
        .map_err(|e| codec_error("ownerOf lookup", e))?;
    let tokens = function
        .decode_output(output)
        .map_err(|e| codec_error("ownerOf decoding", e))?;
    match tokens.into_iter().next() {
        Some(Token::Address(address)) => Ok(address),
        other => Err(GatewayError::Codec(format!(
            "ownerOf returned no address: {other:?}"
        ))),
    }
}

/// Mine the new record id out of confirmation logs: the first log parsing as
/// a `Transfer` or `WillCreated` event yields its `tokenId` argument. `None`
/// when no log matches, which is a valid outcome, not an error.
pub fn record_id_from_logs(logs: &[RawLog]) -> Option<u64> {
    for log in logs {
        for name in CREATION_EVENTS {
            let Ok(event) = REGISTRY_ABI.event(name) else {
                continue;
            };
            let Ok(parsed) = event.parse_log(log.clone()) else {
                continue;
            };
            for param in parsed.params {
                if param.name == "tokenId" {
                    if let Token::Uint(id) = param.value {
                        if id <= U256::from(u64::MAX) {
                            return Some(id.as_u64());
                        }
                    }
                }
            }
        }
    }
    None
}

/// Topic 0 for a named registry event; used by tests building synthetic logs.
pub fn event_signature(name: &str) -> Option<H256> {
    REGISTRY_ABI.event(name).ok().map(|event| event.signature())
}

fn token_u64(token: Option<&Token>) -> u64 {
    match token {
        Some(Token::Uint(value)) => {
            if *value > U256::from(u64::MAX) {
                u64::MAX
            } else {
                value.as_u64()
            }
        }
        _ => 0,
    }
}

fn token_bool(token: Option<&Token>) -> bool {
    matches!(token, Some(Token::Bool(true)))
}

fn token_addresses(token: Option<&Token>) -> Vec<Address> {
    match token {
        Some(Token::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Token::Address(address) => Some(*address),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn token_h256(token: Option<&Token>) -> H256 {
    match token {
        Some(Token::FixedBytes(bytes)) if bytes.len() == 32 => H256::from_slice(bytes),
        _ => H256::zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn address_topic(address: Address) -> H256 {
        let mut padded = [0u8; 32];
        padded[12..].copy_from_slice(address.as_bytes());
        H256::from(padded)
    }

    #[test]
    fn create_call_roundtrips_through_decode() {
        let nominees = vec![address(1), address(2)];
        let hash = H256::from_low_u64_be(0x11);
        let data = encode_create_will(2_000_000_000, &nominees, hash).unwrap();

        let function = REGISTRY_ABI.function("createWill").unwrap();
        let tokens = function.decode_input(&data[4..]).unwrap();
        assert_eq!(tokens[0], Token::Uint(U256::from(2_000_000_000u64)));
        assert_eq!(
            tokens[1],
            Token::Array(vec![Token::Address(address(1)), Token::Address(address(2))])
        );
    }

    #[test]
    fn get_will_output_decodes_defensively() {
        let encoded = ethers::abi::encode(&[
            Token::Uint(U256::from(2_000_000_000u64)),
            Token::Bool(false),
            Token::Array(vec![Token::Address(address(7))]),
            Token::FixedBytes(H256::from_low_u64_be(0x11).as_bytes().to_vec()),
            Token::FixedBytes(H256::zero().as_bytes().to_vec()),
            Token::Bool(false),
        ]);
        let record = decode_will_output(&encoded).unwrap();
        assert_eq!(record.deadline, 2_000_000_000);
        assert!(!record.triggered);
        assert_eq!(record.nominees, vec![address(7)]);
        assert!(record.is_valid_will());

        // Truncated output is a codec error, not a panic.
        assert!(decode_will_output(&encoded[..16]).is_err());
    }

    #[test]
    fn record_id_extracted_from_transfer_log() {
        let log = RawLog {
            topics: vec![
                event_signature("Transfer").unwrap(),
                address_topic(Address::zero()),
                address_topic(address(5)),
                H256::from_low_u64_be(42),
            ],
            data: Vec::new(),
        };
        assert_eq!(record_id_from_logs(&[log]), Some(42));
    }

    #[test]
    fn record_id_extracted_from_will_created_log() {
        let log = RawLog {
            topics: vec![
                event_signature("WillCreated").unwrap(),
                H256::from_low_u64_be(7),
                address_topic(address(5)),
            ],
            data: ethers::abi::encode(&[Token::Uint(U256::from(2_000_000_000u64))]),
        };
        assert_eq!(record_id_from_logs(&[log]), Some(7));
    }

    #[test]
    fn unrelated_logs_yield_no_record_id() {
        let log = RawLog {
            topics: vec![H256::from_low_u64_be(0xdead)],
            data: vec![1, 2, 3],
        };
        assert_eq!(record_id_from_logs(&[log]), None);
        assert_eq!(record_id_from_logs(&[]), None);
    }
}
