use serde::{Deserialize, Serialize};

use super::session::WalletConnection;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    pub network: Option<String>,
    pub wallet: Option<WalletConnection>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SwitchNetworkRequest {
    pub network: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManualAddressRequest {
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressValidation {
    pub address: String,
    pub valid: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CopyResponse {
    pub text: String,
    pub copied: bool,
}
