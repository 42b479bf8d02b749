use std::sync::Arc;

use anyhow::Result;

use vaultguard_api::api::{start_api_server, AppState};
use vaultguard_api::config::Config;
use vaultguard_api::gateway::EthGateway;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    log::info!(
        "starting VaultGuard API against {} (registry {})",
        config.rpc_url,
        config.registry_address
    );

    let gateway = Arc::new(EthGateway::new(&config)?);
    let state = AppState {
        gateway,
        config: Arc::new(config.clone()),
    };

    start_api_server(config, state).await
}
