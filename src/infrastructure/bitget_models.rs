//! Wire types for the Bitget v2 REST endpoints
//!
//! Numeric fields arrive as decimal strings (sometimes as bare numbers).
//! Missing or empty numeric fields read as `0`. The response envelope is
//! checked separately so a missing `code` is never taken for success.

use crate::domain::entities::product::{PeriodType, Product, Tier};
use crate::domain::entities::snapshot::SubscribeInfo;
use crate::domain::repositories::exchange_gateway::{
    IssuedApiKey, SpotBalance, SubAccountFailure, VirtualSubAccount,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Status code of a successful call
pub const SUCCESS_CODE: &str = "00000";

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Ids are documented as strings but some endpoints send numbers
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_string(deserializer)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualSubAccountList {
    #[serde(default)]
    pub sub_account_list: Vec<VirtualSubAccountItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualSubAccountItem {
    #[serde(default, alias = "subaAccountUid", deserialize_with = "lenient_string")]
    pub sub_account_uid: String,
    #[serde(default, alias = "subaAccountName")]
    pub sub_account_name: String,
    #[serde(default)]
    pub status: String,
}

impl From<VirtualSubAccountItem> for VirtualSubAccount {
    fn from(item: VirtualSubAccountItem) -> Self {
        Self {
            uid: item.sub_account_uid,
            name: item.sub_account_name,
            status: item.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubAccountsRequest<'a> {
    pub sub_account_list: &'a [String],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubAccountsResponse {
    #[serde(default)]
    pub success_list: Vec<VirtualSubAccountItem>,
    #[serde(default)]
    pub failure_list: Vec<CreateSubAccountFailure>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubAccountFailure {
    #[serde(default, rename = "subaAccountName", alias = "subAccountName")]
    pub sub_account_name: String,
    #[serde(default)]
    pub reason: String,
}

impl From<CreateSubAccountFailure> for SubAccountFailure {
    fn from(item: CreateSubAccountFailure) -> Self {
        Self {
            name: item.sub_account_name,
            reason: if item.reason.is_empty() {
                "unknown reason".to_string()
            } else {
                item.reason
            },
        }
    }
}

fn is_empty_list(list: &&[String]) -> bool {
    list.is_empty()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest<'a> {
    pub sub_account_uid: &'a str,
    pub passphrase: &'a str,
    pub label: &'a str,
    pub perm_list: &'a [String],
    #[serde(skip_serializing_if = "is_empty_list")]
    pub ip_list: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyResponse {
    #[serde(default)]
    pub sub_account_api_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub perm_list: Vec<String>,
    #[serde(default)]
    pub ip_list: Vec<String>,
}

impl From<CreateApiKeyResponse> for IssuedApiKey {
    fn from(item: CreateApiKeyResponse) -> Self {
        Self {
            api_key: item.sub_account_api_key,
            secret_key: item.secret_key,
            permissions: item.perm_list,
            ip_list: item.ip_list,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfoResponse {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpotAsset {
    #[serde(default)]
    pub coin: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub available: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub frozen: f64,
}

impl From<SpotAsset> for SpotBalance {
    fn from(asset: SpotAsset) -> Self {
        Self {
            available: asset.available,
            frozen: asset.frozen,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsProductItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_id: String,
    #[serde(default)]
    pub coin: String,
    #[serde(default)]
    pub period_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub period: String,
    #[serde(default)]
    pub product_level: String,
    #[serde(default)]
    pub apy_type: String,
    #[serde(default)]
    pub apy_list: Vec<ApyStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApyStep {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_step_val: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max_step_val: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_apy: f64,
}

impl SavingsProductItem {
    /// Convert to the domain product; `coin` fills in when the item omits it
    pub fn into_product(self, coin: &str) -> Product {
        let period_type = PeriodType::parse(&self.period_type).unwrap_or(PeriodType::Flexible);
        let tiers = self
            .apy_list
            .into_iter()
            .map(|step| Tier {
                index: 0,
                min_amount: step.min_step_val,
                max_amount: step.max_step_val,
                annual_rate_pct: step.current_apy,
            })
            .collect();
        let product_coin = if self.coin.is_empty() {
            coin.to_uppercase()
        } else {
            self.coin
        };

        let mut product = Product::new(
            &self.product_id,
            &product_coin,
            period_type,
            self.period.trim().parse().ok(),
            tiers,
        );
        if !self.product_level.is_empty() {
            product.level = self.product_level;
        }
        product.apy_type = self.apy_type;
        product
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAssets {
    #[serde(default)]
    pub result_list: Vec<SavingsAssetItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAssetItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_id: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hold_amount: f64,
}

impl SavingsAssets {
    /// Holding in `product_id`, zero when absent
    pub fn holding_of(&self, product_id: &str) -> f64 {
        self.result_list
            .iter()
            .find(|item| item.product_id == product_id)
            .map(|item| item.hold_amount)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeInfoResponse {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub single_min_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub single_max_amount: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub remaining_amount: f64,
}

impl From<SubscribeInfoResponse> for SubscribeInfo {
    fn from(item: SubscribeInfoResponse) -> Self {
        Self {
            single_min_amount: item.single_min_amount,
            single_max_amount: item.single_max_amount,
            remaining_amount: item.remaining_amount,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsOrderRequest<'a> {
    pub product_id: &'a str,
    pub period_type: &'a str,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIdResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub order_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest<'a> {
    pub from_type: &'a str,
    pub to_type: &'a str,
    pub amount: String,
    pub coin: &'a str,
    pub from_user_id: &'a str,
    pub to_user_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub transfer_id: String,
}
