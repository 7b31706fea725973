use crate::{errors::CustomError, models::network_config::NetworkConfig};

pub const SUPPORTED_NETWORKS: [&str; 5] = ["mainnet", "testnet", "signet", "regtest", "oylnet"];

/// Get the built-in network configuration by name
pub fn get_network_config(network: &str) -> Result<NetworkConfig, CustomError> {
    match network {
        "mainnet" => Ok(NetworkConfig {
            name: "mainnet".to_string(),
            display_name: "Bitcoin Mainnet".to_string(),
            rpc_url: "https://mainnet.sandshrew.io/v2/lasereyes".to_string(),
            block_explorer: "https://mempool.space".to_string(),
        }),
        "testnet" => Ok(NetworkConfig {
            name: "testnet".to_string(),
            display_name: "Bitcoin Testnet".to_string(),
            rpc_url: "https://testnet.sandshrew.io/v2/lasereyes".to_string(),
            block_explorer: "https://mempool.space/testnet".to_string(),
        }),
        "signet" => Ok(NetworkConfig {
            name: "signet".to_string(),
            display_name: "Bitcoin Signet".to_string(),
            rpc_url: "https://signet.sandshrew.io/v2/lasereyes".to_string(),
            block_explorer: "https://mempool.space/signet".to_string(),
        }),
        "regtest" => Ok(NetworkConfig {
            name: "regtest".to_string(),
            display_name: "Local Regtest".to_string(),
            rpc_url: "http://localhost:18888".to_string(),
            block_explorer: "http://localhost:50010".to_string(),
        }),
        "oylnet" => Ok(NetworkConfig {
            name: "oylnet".to_string(),
            display_name: "Oylnet".to_string(),
            rpc_url: "https://oylnet.oyl.gg/v2/lasereyes".to_string(),
            block_explorer: "https://oylnet.oyl.gg".to_string(),
        }),
        _ => Err(CustomError::UnsupportedNetworkError(network.to_string())),
    }
}
