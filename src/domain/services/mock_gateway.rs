//! In-memory gateway shared by the service unit tests

use crate::domain::entities::product::Product;
use crate::domain::entities::snapshot::SubscribeInfo;
use crate::domain::errors::{GatewayError, GatewayResult};
use crate::domain::repositories::exchange_gateway::{
    AccountInfo, ApiKeyRequest, ExchangeGateway, IssuedApiKey, SpotBalance, SubAccountCreation,
    SubAccountTransfer, VirtualSubAccount,
};
use crate::domain::value_objects::amount::Amount;
use crate::secrets::ApiCredentials;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockState {
    /// Savings holding per api key
    pub holdings: HashMap<String, f64>,
    /// Spot balance per api key
    pub balances: HashMap<String, SpotBalance>,
    /// Api keys whose reads fail
    pub failing_reads: HashSet<String>,
    /// Api keys whose subscribe/redeem fail
    pub failing_writes: HashSet<String>,
    /// Transfer targets/sources (uids) that fail
    pub failing_transfers: HashSet<String>,
    /// Sub-account uids whose key issuance fails
    pub failing_key_issuance: HashSet<String>,
    pub subaccounts: Vec<VirtualSubAccount>,
    pub products: Vec<Product>,
    pub main_user_id: Option<String>,
    pub calls: Vec<String>,
    pub next_id: u64,
}

pub struct MockGateway {
    pub state: Mutex<MockState>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_state(state: MockState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn holding(&self, api_key: &str) -> f64 {
        *self.state.lock().unwrap().holdings.get(api_key).unwrap_or(&0.0)
    }

    fn record(&self, call: String) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state.next_id += 1;
        state.next_id
    }

    fn rejected(reason: &str) -> GatewayError {
        GatewayError::Api {
            code: "40001".to_string(),
            message: reason.to_string(),
        }
    }
}

#[async_trait]
impl ExchangeGateway for MockGateway {
    fn name(&self) -> &str {
        "MockGateway"
    }

    async fn list_virtual_subaccounts(
        &self,
        _main: &ApiCredentials,
    ) -> GatewayResult<Vec<VirtualSubAccount>> {
        self.record("list".to_string());
        Ok(self.state.lock().unwrap().subaccounts.clone())
    }

    async fn create_virtual_subaccounts(
        &self,
        _main: &ApiCredentials,
        names: &[String],
    ) -> GatewayResult<SubAccountCreation> {
        self.record(format!("create:{}", names.len()));
        let mut state = self.state.lock().unwrap();
        let mut creation = SubAccountCreation::default();
        for name in names {
            state.next_id += 1;
            let account = VirtualSubAccount {
                uid: format!("{}", 9000 + state.next_id),
                name: name.clone(),
                status: "normal".to_string(),
            };
            state.subaccounts.push(account.clone());
            creation.created.push(account);
        }
        Ok(creation)
    }

    async fn create_subaccount_api_key(
        &self,
        _main: &ApiCredentials,
        request: &ApiKeyRequest,
    ) -> GatewayResult<IssuedApiKey> {
        let id = self.record(format!("apikey:{}", request.sub_account_uid));
        if self
            .state
            .lock()
            .unwrap()
            .failing_key_issuance
            .contains(&request.sub_account_uid)
        {
            return Err(Self::rejected("key limit reached"));
        }
        Ok(IssuedApiKey {
            api_key: format!("key-{}", request.sub_account_uid),
            secret_key: format!("secret-{}", id),
            permissions: request.permissions.clone(),
            ip_list: request.ip_list.clone(),
        })
    }

    async fn account_info(&self, _credentials: &ApiCredentials) -> GatewayResult<AccountInfo> {
        self.record("info".to_string());
        Ok(AccountInfo {
            user_id: self.state.lock().unwrap().main_user_id.clone(),
        })
    }

    async fn spot_balance(
        &self,
        credentials: &ApiCredentials,
        _coin: &str,
    ) -> GatewayResult<SpotBalance> {
        let state = self.state.lock().unwrap();
        if state.failing_reads.contains(credentials.api_key()) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        Ok(state
            .balances
            .get(credentials.api_key())
            .cloned()
            .unwrap_or_default())
    }

    async fn savings_products(
        &self,
        _credentials: &ApiCredentials,
        _coin: &str,
    ) -> GatewayResult<Vec<Product>> {
        Ok(self.state.lock().unwrap().products.clone())
    }

    async fn savings_holding(
        &self,
        credentials: &ApiCredentials,
        _product: &Product,
    ) -> GatewayResult<f64> {
        let state = self.state.lock().unwrap();
        if state.failing_reads.contains(credentials.api_key()) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        Ok(*state.holdings.get(credentials.api_key()).unwrap_or(&0.0))
    }

    async fn subscribe_info(
        &self,
        _credentials: &ApiCredentials,
        _product: &Product,
    ) -> GatewayResult<SubscribeInfo> {
        Ok(SubscribeInfo {
            single_min_amount: 0.1,
            single_max_amount: 10_000.0,
            remaining_amount: 1_000_000.0,
        })
    }

    async fn subscribe(
        &self,
        credentials: &ApiCredentials,
        _product: &Product,
        amount: Amount,
    ) -> GatewayResult<String> {
        let id = self.record(format!("subscribe:{}:{}", credentials.api_key(), amount.value()));
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.contains(credentials.api_key()) {
            return Err(Self::rejected("subscription quota exceeded"));
        }
        *state
            .holdings
            .entry(credentials.api_key().to_string())
            .or_insert(0.0) += amount.value();
        Ok(format!("order-{}", id))
    }

    async fn redeem(
        &self,
        credentials: &ApiCredentials,
        _product: &Product,
        amount: Amount,
    ) -> GatewayResult<String> {
        let id = self.record(format!("redeem:{}:{}", credentials.api_key(), amount.value()));
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.contains(credentials.api_key()) {
            return Err(Self::rejected("redemption paused"));
        }
        *state
            .holdings
            .entry(credentials.api_key().to_string())
            .or_insert(0.0) -= amount.value();
        Ok(format!("order-{}", id))
    }

    async fn subaccount_transfer(
        &self,
        _main: &ApiCredentials,
        transfer: &SubAccountTransfer,
    ) -> GatewayResult<String> {
        let id = self.record(format!(
            "transfer:{}->{}:{}",
            transfer.from_user_id,
            transfer.to_user_id,
            transfer.amount.value()
        ));
        let state = self.state.lock().unwrap();
        if state.failing_transfers.contains(&transfer.from_user_id)
            || state.failing_transfers.contains(&transfer.to_user_id)
        {
            return Err(Self::rejected("transfer not allowed"));
        }
        Ok(format!("transfer-{}", id))
    }
}
