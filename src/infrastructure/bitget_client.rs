use crate::auth::signed_headers;
use crate::domain::entities::product::Product;
use crate::domain::entities::snapshot::SubscribeInfo;
use crate::domain::errors::{GatewayError, GatewayResult};
use crate::domain::repositories::exchange_gateway::{
    AccountInfo, ApiKeyRequest, ExchangeGateway, IssuedApiKey, SpotBalance, SubAccountCreation,
    SubAccountTransfer, VirtualSubAccount,
};
use crate::domain::value_objects::amount::Amount;
use crate::infrastructure::bitget_models::*;
use crate::secrets::ApiCredentials;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Bitget REST endpoint
pub const BITGET_API_BASE: &str = "https://api.bitget.com";

const USER_AGENT: &str = concat!("flexman/", env!("CARGO_PKG_VERSION"));

/// Page size for the savings assets query
const SAVINGS_ASSETS_LIMIT: &str = "20";

#[derive(Debug, Clone)]
pub struct BitgetConfig {
    pub api_base: String,
    pub timeout: Duration,
}

impl BitgetConfig {
    pub fn new(api_base: &str, timeout: Duration) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout,
        }
    }
}

impl Default for BitgetConfig {
    fn default() -> Self {
        Self::new(BITGET_API_BASE, Duration::from_secs(10))
    }
}

/// Bitget client; every call is signed with the credentials it is given
pub struct BitgetClient {
    client: Client,
    config: BitgetConfig,
}

/// `path?k=v&...` with form encoding, exactly as it is signed and sent
pub fn path_with_query(path: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query)
        .finish();
    format!("{}?{}", path, encoded)
}

/// Check the response envelope and hand back its `data`.
///
/// A body without `code` is an error, never a success.
pub fn parse_envelope(body: &str) -> GatewayResult<serde_json::Value> {
    let envelope: serde_json::Value =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;

    let code = match envelope.get("code") {
        Some(serde_json::Value::String(code)) => code.clone(),
        Some(serde_json::Value::Number(code)) => code.to_string(),
        _ => return Err(GatewayError::MissingStatus),
    };

    if code != SUCCESS_CODE {
        let message = envelope
            .get("msg")
            .and_then(|m| m.as_str())
            .unwrap_or("no message")
            .to_string();
        return Err(GatewayError::Api { code, message });
    }

    Ok(envelope
        .get("data")
        .cloned()
        .unwrap_or(serde_json::Value::Null))
}

fn decode<T: DeserializeOwned>(data: serde_json::Value) -> GatewayResult<T> {
    if data.is_null() {
        return Err(GatewayError::MissingField("data".to_string()));
    }
    serde_json::from_value(data).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl BitgetClient {
    pub fn new(config: BitgetConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GatewayError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        credentials: &ApiCredentials,
        path: &str,
        query: &[(&str, &str)],
    ) -> GatewayResult<T> {
        let request_path = path_with_query(path, query);
        let data = self.send("GET", credentials, &request_path, String::new()).await?;
        decode(data)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        credentials: &ApiCredentials,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        let body = serde_json::to_string(body)
            .map_err(|e| GatewayError::Decode(format!("Failed to serialize request: {}", e)))?;
        let data = self.send("POST", credentials, path, body).await?;
        decode(data)
    }

    async fn send(
        &self,
        method: &str,
        credentials: &ApiCredentials,
        request_path: &str,
        body: String,
    ) -> GatewayResult<serde_json::Value> {
        let url = format!("{}{}", self.config.api_base, request_path);
        let headers = signed_headers(credentials, method, request_path, &body)?;

        let mut request = match method {
            "POST" => self.client.post(&url).body(body),
            _ => self.client.get(&url),
        };
        for (key, value) in headers {
            request = request.header(key, value);
        }

        debug!("{} {}", method, request_path);

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        match parse_envelope(&text) {
            Err(GatewayError::Decode(_)) | Err(GatewayError::MissingStatus) if !status.is_success() => {
                Err(GatewayError::Transport(format!("HTTP {}: {}", status, text)))
            }
            other => other,
        }
    }
}

#[async_trait]
impl ExchangeGateway for BitgetClient {
    fn name(&self) -> &str {
        "Bitget"
    }

    async fn list_virtual_subaccounts(
        &self,
        main: &ApiCredentials,
    ) -> GatewayResult<Vec<VirtualSubAccount>> {
        let list: VirtualSubAccountList = self
            .get(main, "/api/v2/user/virtual-subaccount-list", &[])
            .await?;
        Ok(list.sub_account_list.into_iter().map(Into::into).collect())
    }

    async fn create_virtual_subaccounts(
        &self,
        main: &ApiCredentials,
        names: &[String],
    ) -> GatewayResult<SubAccountCreation> {
        let response: CreateSubAccountsResponse = self
            .post(
                main,
                "/api/v2/user/create-virtual-subaccount",
                &CreateSubAccountsRequest {
                    sub_account_list: names,
                },
            )
            .await?;

        Ok(SubAccountCreation {
            created: response.success_list.into_iter().map(Into::into).collect(),
            failed: response.failure_list.into_iter().map(Into::into).collect(),
        })
    }

    async fn create_subaccount_api_key(
        &self,
        main: &ApiCredentials,
        request: &ApiKeyRequest,
    ) -> GatewayResult<IssuedApiKey> {
        let response: CreateApiKeyResponse = self
            .post(
                main,
                "/api/v2/user/create-virtual-subaccount-apikey",
                &CreateApiKeyRequest {
                    sub_account_uid: &request.sub_account_uid,
                    passphrase: &request.passphrase,
                    label: &request.label,
                    perm_list: &request.permissions,
                    ip_list: &request.ip_list,
                },
            )
            .await?;

        if response.sub_account_api_key.is_empty() || response.secret_key.is_empty() {
            return Err(GatewayError::MissingField("subAccountApiKey".to_string()));
        }
        Ok(response.into())
    }

    async fn account_info(&self, credentials: &ApiCredentials) -> GatewayResult<AccountInfo> {
        let info: AccountInfoResponse = self
            .get(credentials, "/api/v2/spot/account/info", &[])
            .await?;
        Ok(AccountInfo {
            user_id: info.user_id,
        })
    }

    async fn spot_balance(
        &self,
        credentials: &ApiCredentials,
        coin: &str,
    ) -> GatewayResult<SpotBalance> {
        let assets: Vec<SpotAsset> = self
            .get(credentials, "/api/v2/spot/account/assets", &[("coin", coin)])
            .await?;
        Ok(assets.into_iter().next().map(Into::into).unwrap_or_default())
    }

    async fn savings_products(
        &self,
        credentials: &ApiCredentials,
        coin: &str,
    ) -> GatewayResult<Vec<Product>> {
        let items: Vec<SavingsProductItem> = self
            .get(
                credentials,
                "/api/v2/earn/savings/product",
                &[("coin", coin), ("filter", "available")],
            )
            .await?;
        Ok(items.into_iter().map(|item| item.into_product(coin)).collect())
    }

    async fn savings_holding(
        &self,
        credentials: &ApiCredentials,
        product: &Product,
    ) -> GatewayResult<f64> {
        let assets: SavingsAssets = self
            .get(
                credentials,
                "/api/v2/earn/savings/assets",
                &[
                    ("periodType", product.period_type.as_str()),
                    ("limit", SAVINGS_ASSETS_LIMIT),
                ],
            )
            .await?;
        Ok(assets.holding_of(&product.product_id))
    }

    async fn subscribe_info(
        &self,
        credentials: &ApiCredentials,
        product: &Product,
    ) -> GatewayResult<SubscribeInfo> {
        let info: SubscribeInfoResponse = self
            .get(
                credentials,
                "/api/v2/earn/savings/subscribe-info",
                &[
                    ("productId", product.product_id.as_str()),
                    ("periodType", product.period_type.as_str()),
                ],
            )
            .await?;
        Ok(info.into())
    }

    async fn subscribe(
        &self,
        credentials: &ApiCredentials,
        product: &Product,
        amount: Amount,
    ) -> GatewayResult<String> {
        let response: OrderIdResponse = self
            .post(
                credentials,
                "/api/v2/earn/savings/subscribe",
                &SavingsOrderRequest {
                    product_id: &product.product_id,
                    period_type: product.period_type.as_str(),
                    amount: amount.to_api_string(),
                },
            )
            .await?;
        Ok(response.order_id)
    }

    async fn redeem(
        &self,
        credentials: &ApiCredentials,
        product: &Product,
        amount: Amount,
    ) -> GatewayResult<String> {
        let response: OrderIdResponse = self
            .post(
                credentials,
                "/api/v2/earn/savings/redeem",
                &SavingsOrderRequest {
                    product_id: &product.product_id,
                    period_type: product.period_type.as_str(),
                    amount: amount.to_api_string(),
                },
            )
            .await?;
        Ok(response.order_id)
    }

    async fn subaccount_transfer(
        &self,
        main: &ApiCredentials,
        transfer: &SubAccountTransfer,
    ) -> GatewayResult<String> {
        let response: TransferResponse = self
            .post(
                main,
                "/api/v2/spot/wallet/subaccount-transfer",
                &TransferRequest {
                    from_type: &transfer.from_type,
                    to_type: &transfer.to_type,
                    amount: transfer.amount.to_api_string(),
                    coin: &transfer.coin,
                    from_user_id: &transfer.from_user_id,
                    to_user_id: &transfer.to_user_id,
                },
            )
            .await?;
        Ok(response.transfer_id)
    }
}
