pub mod alkane;
pub mod api_response;
pub mod network_config;
pub mod requests;
pub mod session;
