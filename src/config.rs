use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CustomError;
use crate::models::network_config::NetworkConfig;
use crate::services::network_config::{get_network_config, SUPPORTED_NETWORKS};

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:8080,http://localhost:5173";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_network: String,
    pub allowed_origins: Vec<String>,
    pub rpc_timeout: Duration,
    /// Idle time after which a session is evicted.
    pub session_ttl: chrono::Duration,
    pub networks: HashMap<String, NetworkConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, CustomError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup, e.g. the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CustomError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .map_err(|e| CustomError::ConfigError(format!("Failed to parse PORT: {}", e)))?;

        let rpc_timeout_secs: u64 = lookup("RPC_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .map_err(|e| {
                CustomError::ConfigError(format!("Failed to parse RPC_TIMEOUT_SECS: {}", e))
            })?;

        let session_ttl_secs: i64 = lookup("SESSION_TTL_SECS")
            .unwrap_or_else(|| "1800".to_string())
            .parse()
            .map_err(|e| {
                CustomError::ConfigError(format!("Failed to parse SESSION_TTL_SECS: {}", e))
            })?;
        let session_ttl = chrono::Duration::try_seconds(session_ttl_secs)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| {
                CustomError::ConfigError(format!(
                    "SESSION_TTL_SECS must be a positive number of seconds, got {}",
                    session_ttl_secs
                ))
            })?;

        let mut networks = HashMap::new();
        for name in SUPPORTED_NETWORKS {
            let mut network = get_network_config(name)?;
            if let Some(rpc_url) = lookup(&format!("{}_RPC_URL", name.to_uppercase())) {
                network.rpc_url = rpc_url;
            }
            networks.insert(name.to_string(), network);
        }

        let default_network = lookup("DEFAULT_NETWORK").unwrap_or_else(|| "mainnet".to_string());
        if !networks.contains_key(&default_network) {
            return Err(CustomError::ConfigError(format!(
                "DEFAULT_NETWORK {} is not supported",
                default_network
            )));
        }

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            default_network,
            allowed_origins,
            rpc_timeout: Duration::from_secs(rpc_timeout_secs),
            session_ttl,
            networks,
        })
    }
}
