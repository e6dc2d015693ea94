//! flexman library
//!
//! Sub-account management for a single exchange: provisioning virtual
//! sub-accounts and their API keys, tier-aware savings rebalancing and
//! main/sub-account transfers, each followed by a before/after reconciliation.

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
pub mod secrets;
