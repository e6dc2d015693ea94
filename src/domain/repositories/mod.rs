pub mod config_repository;
pub mod exchange_gateway;
