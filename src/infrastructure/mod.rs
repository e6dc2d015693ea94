pub mod bitget_client;
pub mod bitget_models;
pub mod public_ip;
pub mod version_checker;
