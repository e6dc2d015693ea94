//! Exchange Gateway Trait
//!
//! This module defines the `ExchangeGateway` trait, the single seam between
//! the planners/executor and the exchange's signed REST API. Every call takes
//! the credentials of the account it acts for.
//!
//! ## Failure policy
//! - Any non-success status code, transport error or undecodable payload is a
//!   `GatewayError`; callers record it and move on
//! - Missing numeric fields read as `0`
//! - A missing status code is an error, never a success

use crate::domain::entities::product::Product;
use crate::domain::entities::snapshot::SubscribeInfo;
use crate::domain::errors::GatewayResult;
use crate::domain::value_objects::amount::Amount;
use crate::secrets::ApiCredentials;
use async_trait::async_trait;

/// Virtual sub-account as listed by the exchange
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualSubAccount {
    pub uid: String,
    pub name: String,
    pub status: String,
}

/// Result of a batch sub-account creation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubAccountCreation {
    pub created: Vec<VirtualSubAccount>,
    pub failed: Vec<SubAccountFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubAccountFailure {
    pub name: String,
    pub reason: String,
}

/// Parameters for issuing a sub-account API key
#[derive(Debug, Clone, PartialEq)]
pub struct ApiKeyRequest {
    pub sub_account_uid: String,
    pub passphrase: String,
    pub label: String,
    pub permissions: Vec<String>,
    pub ip_list: Vec<String>,
}

/// A freshly issued sub-account API key
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedApiKey {
    pub api_key: String,
    pub secret_key: String,
    pub permissions: Vec<String>,
    pub ip_list: Vec<String>,
}

/// Basic account information
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    /// Absent when the exchange omits `userId`
    pub user_id: Option<String>,
}

/// Spot wallet balance for one coin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotBalance {
    pub available: f64,
    pub frozen: f64,
}

/// Wallet types a transfer can move between
pub const SPOT_WALLET: &str = "spot";

/// Transfer between the main account and one of its sub-accounts.
/// Always signed with the main account's credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct SubAccountTransfer {
    pub from_user_id: String,
    pub to_user_id: String,
    pub coin: String,
    pub amount: Amount,
    pub from_type: String,
    pub to_type: String,
}

impl SubAccountTransfer {
    pub fn spot(from_user_id: &str, to_user_id: &str, coin: &str, amount: Amount) -> Self {
        Self {
            from_user_id: from_user_id.to_string(),
            to_user_id: to_user_id.to_string(),
            coin: coin.to_string(),
            amount,
            from_type: SPOT_WALLET.to_string(),
            to_type: SPOT_WALLET.to_string(),
        }
    }
}

/// Exchange gateway trait providing the calls the tool needs
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Get the name of this exchange
    fn name(&self) -> &str;

    /// List the main account's virtual sub-accounts
    async fn list_virtual_subaccounts(
        &self,
        main: &ApiCredentials,
    ) -> GatewayResult<Vec<VirtualSubAccount>>;

    /// Create virtual sub-accounts with the given names in one call
    async fn create_virtual_subaccounts(
        &self,
        main: &ApiCredentials,
        names: &[String],
    ) -> GatewayResult<SubAccountCreation>;

    /// Issue an API key for a virtual sub-account
    async fn create_subaccount_api_key(
        &self,
        main: &ApiCredentials,
        request: &ApiKeyRequest,
    ) -> GatewayResult<IssuedApiKey>;

    async fn account_info(&self, credentials: &ApiCredentials) -> GatewayResult<AccountInfo>;

    /// Spot wallet balance of `coin`; zero when the wallet holds none
    async fn spot_balance(&self, credentials: &ApiCredentials, coin: &str)
        -> GatewayResult<SpotBalance>;

    /// Savings products currently open for subscription
    async fn savings_products(
        &self,
        credentials: &ApiCredentials,
        coin: &str,
    ) -> GatewayResult<Vec<Product>>;

    /// Amount held in `product`; zero when the account holds none
    async fn savings_holding(
        &self,
        credentials: &ApiCredentials,
        product: &Product,
    ) -> GatewayResult<f64>;

    async fn subscribe_info(
        &self,
        credentials: &ApiCredentials,
        product: &Product,
    ) -> GatewayResult<SubscribeInfo>;

    /// Subscribe to `product`; returns the exchange order id
    async fn subscribe(
        &self,
        credentials: &ApiCredentials,
        product: &Product,
        amount: Amount,
    ) -> GatewayResult<String>;

    /// Redeem from `product`; returns the exchange order id
    async fn redeem(
        &self,
        credentials: &ApiCredentials,
        product: &Product,
        amount: Amount,
    ) -> GatewayResult<String>;

    /// Move funds between main and sub-account; returns the transfer id
    async fn subaccount_transfer(
        &self,
        main: &ApiCredentials,
        transfer: &SubAccountTransfer,
    ) -> GatewayResult<String>;
}
