//! Runtime configuration for the VaultGuard API.
//!
//! Everything the service consumes from its deployment lives here: the RPC
//! endpoint, the registry contract address, timeouts, and the tunables that
//! used to be magic constants (scan horizon, default gas limit, deadline
//! defaults). Values come from `VAULTGUARD_*` environment variables with
//! hard defaults matching the Sepolia deployment.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default RPC endpoint (Sepolia public node).
const DEFAULT_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";

/// Default VaultGuard registry contract address on Sepolia.
const DEFAULT_REGISTRY_ADDRESS: &str = "0x141fa614e6b3a24e8076777b56e22a447d156884";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub listen_port: u16,
    /// JSON-RPC endpoint of the ledger node.
    pub rpc_url: String,
    /// Address of the will registry contract.
    pub registry_address: String,
    /// Timeout for read-path ledger calls, in seconds.
    pub request_timeout_secs: u64,
    /// Timeout for broadcast-and-await-confirmation, in seconds.
    pub broadcast_timeout_secs: u64,
    /// The discovery scanner examines at most `limit * scan_horizon_multiplier`
    /// identifiers per request.
    pub scan_horizon_multiplier: u64,
    /// Gas limit used when on-chain estimation fails.
    pub default_gas_limit: u64,
    /// Deadline offset applied when a prepare request omits one, in seconds.
    pub default_deadline_offset_secs: u64,
    /// Optional upper bound on the requested deadline offset. Unset means
    /// arbitrarily far-future deadlines are accepted.
    pub max_deadline_offset_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_port: 3000,
            rpc_url: DEFAULT_RPC_URL.to_string(),
            registry_address: DEFAULT_REGISTRY_ADDRESS.to_string(),
            request_timeout_secs: 10,
            broadcast_timeout_secs: 120,
            scan_horizon_multiplier: 10,
            default_gas_limit: 300_000,
            default_deadline_offset_secs: 30 * 24 * 60 * 60,
            max_deadline_offset_secs: None,
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults for
    /// any variable that is not set.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(port) = env::var("VAULTGUARD_PORT") {
            config.listen_port = port.parse().context("VAULTGUARD_PORT must be a port number")?;
        }
        if let Ok(url) = env::var("VAULTGUARD_RPC_URL") {
            config.rpc_url = url;
        }
        if let Ok(address) = env::var("VAULTGUARD_REGISTRY_ADDRESS") {
            config.registry_address = address;
        }
        if let Ok(secs) = env::var("VAULTGUARD_REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = secs
                .parse()
                .context("VAULTGUARD_REQUEST_TIMEOUT_SECS must be an integer")?;
        }
        if let Ok(secs) = env::var("VAULTGUARD_BROADCAST_TIMEOUT_SECS") {
            config.broadcast_timeout_secs = secs
                .parse()
                .context("VAULTGUARD_BROADCAST_TIMEOUT_SECS must be an integer")?;
        }
        if let Ok(multiplier) = env::var("VAULTGUARD_SCAN_HORIZON_MULTIPLIER") {
            config.scan_horizon_multiplier = multiplier
                .parse()
                .context("VAULTGUARD_SCAN_HORIZON_MULTIPLIER must be an integer")?;
        }
        if let Ok(gas) = env::var("VAULTGUARD_DEFAULT_GAS_LIMIT") {
            config.default_gas_limit = gas
                .parse()
                .context("VAULTGUARD_DEFAULT_GAS_LIMIT must be an integer")?;
        }
        if let Ok(secs) = env::var("VAULTGUARD_DEFAULT_DEADLINE_SECS") {
            config.default_deadline_offset_secs = secs
                .parse()
                .context("VAULTGUARD_DEFAULT_DEADLINE_SECS must be an integer")?;
        }
        if let Ok(secs) = env::var("VAULTGUARD_MAX_DEADLINE_SECS") {
            config.max_deadline_offset_secs = Some(
                secs.parse()
                    .context("VAULTGUARD_MAX_DEADLINE_SECS must be an integer")?,
            );
        }

        if config.scan_horizon_multiplier == 0 {
            bail!("VAULTGUARD_SCAN_HORIZON_MULTIPLIER must be at least 1");
        }
        if config.default_gas_limit == 0 {
            bail!("VAULTGUARD_DEFAULT_GAS_LIMIT must be at least 1");
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_secs(self.broadcast_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_sepolia() {
        let config = Config::default();
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.registry_address, DEFAULT_REGISTRY_ADDRESS);
        assert_eq!(config.scan_horizon_multiplier, 10);
        assert_eq!(config.default_gas_limit, 300_000);
        assert!(config.max_deadline_offset_secs.is_none());
    }

    #[test]
    fn broadcast_timeout_is_longer_than_read_timeout() {
        let config = Config::default();
        assert!(config.broadcast_timeout() > config.request_timeout());
    }
}
