pub mod address;
pub mod aggregation;
pub mod alkanes_client;
pub mod network_config;
pub mod reconciler;
pub mod session_service;

#[cfg(test)]
pub mod mock_provider;
