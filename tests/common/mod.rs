//! In-memory exchange that books subscriptions, redemptions and transfers

#![allow(dead_code)]

use async_trait::async_trait;
use flexman::application::handlers::AppContext;
use flexman::config::AppConfig;
use flexman::domain::entities::accounts_file::AccountsFile;
use flexman::domain::entities::product::{PeriodType, Product, Tier};
use flexman::domain::entities::snapshot::SubscribeInfo;
use flexman::domain::errors::{GatewayError, GatewayResult};
use flexman::domain::repositories::exchange_gateway::{
    AccountInfo, ApiKeyRequest, ExchangeGateway, IssuedApiKey, SpotBalance, SubAccountCreation,
    SubAccountTransfer, VirtualSubAccount,
};
use flexman::domain::value_objects::amount::Amount;
use flexman::infrastructure::public_ip::FixedIpResolver;
use flexman::secrets::ApiCredentials;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct Wallet {
    pub uid: String,
    pub spot: f64,
    pub savings: f64,
}

#[derive(Default)]
struct Ledger {
    /// Wallets by api key
    wallets: HashMap<String, Wallet>,
    subaccounts: Vec<VirtualSubAccount>,
    main_uid: Option<String>,
    next_uid: u64,
    transfers: Vec<(String, String, f64)>,
}

pub struct FakeExchange {
    ledger: Mutex<Ledger>,
    product: Product,
}

pub fn flexible_usdt() -> Product {
    Product::new(
        "usdt-flex",
        "USDT",
        PeriodType::Flexible,
        None,
        vec![
            Tier { index: 1, min_amount: 0.0, max_amount: 300.0, annual_rate_pct: 8.0 },
            Tier { index: 2, min_amount: 300.0, max_amount: 1.2e8, annual_rate_pct: 1.5 },
        ],
    )
}

impl FakeExchange {
    pub fn new(main_uid: Option<&str>) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                main_uid: main_uid.map(str::to_string),
                next_uid: 5000,
                ..Ledger::default()
            }),
            product: flexible_usdt(),
        }
    }

    /// Register an account's wallet under its api key
    pub fn fund(&self, api_key: &str, uid: &str, spot: f64, savings: f64) {
        self.ledger.lock().unwrap().wallets.insert(
            api_key.to_string(),
            Wallet {
                uid: uid.to_string(),
                spot,
                savings,
            },
        );
    }

    pub fn add_subaccount(&self, uid: &str) {
        self.ledger.lock().unwrap().subaccounts.push(VirtualSubAccount {
            uid: uid.to_string(),
            name: format!("sub{}", uid),
            status: "normal".to_string(),
        });
    }

    pub fn wallet(&self, api_key: &str) -> Wallet {
        self.ledger
            .lock()
            .unwrap()
            .wallets
            .get(api_key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn transfers(&self) -> Vec<(String, String, f64)> {
        self.ledger.lock().unwrap().transfers.clone()
    }

    fn rejected(message: &str) -> GatewayError {
        GatewayError::Api {
            code: "43011".to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ExchangeGateway for FakeExchange {
    fn name(&self) -> &str {
        "FakeExchange"
    }

    async fn list_virtual_subaccounts(&self, _main: &ApiCredentials) -> GatewayResult<Vec<VirtualSubAccount>> {
        Ok(self.ledger.lock().unwrap().subaccounts.clone())
    }

    async fn create_virtual_subaccounts(
        &self,
        _main: &ApiCredentials,
        names: &[String],
    ) -> GatewayResult<SubAccountCreation> {
        let mut ledger = self.ledger.lock().unwrap();
        let mut creation = SubAccountCreation::default();
        for name in names {
            ledger.next_uid += 1;
            let account = VirtualSubAccount {
                uid: ledger.next_uid.to_string(),
                name: name.clone(),
                status: "normal".to_string(),
            };
            ledger.subaccounts.push(account.clone());
            creation.created.push(account);
        }
        Ok(creation)
    }

    async fn create_subaccount_api_key(
        &self,
        _main: &ApiCredentials,
        request: &ApiKeyRequest,
    ) -> GatewayResult<IssuedApiKey> {
        let api_key = format!("key-{}", request.sub_account_uid);
        self.ledger.lock().unwrap().wallets.insert(
            api_key.clone(),
            Wallet {
                uid: request.sub_account_uid.clone(),
                ..Wallet::default()
            },
        );
        Ok(IssuedApiKey {
            api_key,
            secret_key: format!("secret-{}", request.sub_account_uid),
            permissions: request.permissions.clone(),
            ip_list: request.ip_list.clone(),
        })
    }

    async fn account_info(&self, _credentials: &ApiCredentials) -> GatewayResult<AccountInfo> {
        Ok(AccountInfo {
            user_id: self.ledger.lock().unwrap().main_uid.clone(),
        })
    }

    async fn spot_balance(&self, credentials: &ApiCredentials, _coin: &str) -> GatewayResult<SpotBalance> {
        Ok(SpotBalance {
            available: self.wallet(credentials.api_key()).spot,
            frozen: 0.0,
        })
    }

    async fn savings_products(&self, _credentials: &ApiCredentials, coin: &str) -> GatewayResult<Vec<Product>> {
        if coin == self.product.coin {
            Ok(vec![self.product.clone()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn savings_holding(&self, credentials: &ApiCredentials, _product: &Product) -> GatewayResult<f64> {
        Ok(self.wallet(credentials.api_key()).savings)
    }

    async fn subscribe_info(&self, _credentials: &ApiCredentials, _product: &Product) -> GatewayResult<SubscribeInfo> {
        Ok(SubscribeInfo {
            single_min_amount: 0.1,
            single_max_amount: 100_000.0,
            remaining_amount: 1_000_000.0,
        })
    }

    async fn subscribe(&self, credentials: &ApiCredentials, _product: &Product, amount: Amount) -> GatewayResult<String> {
        let mut ledger = self.ledger.lock().unwrap();
        let wallet = ledger
            .wallets
            .get_mut(credentials.api_key())
            .ok_or_else(|| Self::rejected("unknown account"))?;
        if wallet.spot + 1e-9 < amount.value() {
            return Err(Self::rejected("insufficient balance"));
        }
        wallet.spot -= amount.value();
        wallet.savings += amount.value();
        Ok(format!("sub-{}", wallet.uid))
    }

    async fn redeem(&self, credentials: &ApiCredentials, _product: &Product, amount: Amount) -> GatewayResult<String> {
        let mut ledger = self.ledger.lock().unwrap();
        let wallet = ledger
            .wallets
            .get_mut(credentials.api_key())
            .ok_or_else(|| Self::rejected("unknown account"))?;
        if wallet.savings + 1e-9 < amount.value() {
            return Err(Self::rejected("redeem exceeds holding"));
        }
        wallet.savings = (wallet.savings - amount.value()).max(0.0);
        wallet.spot += amount.value();
        Ok(format!("red-{}", wallet.uid))
    }

    async fn subaccount_transfer(&self, _main: &ApiCredentials, transfer: &SubAccountTransfer) -> GatewayResult<String> {
        let mut ledger = self.ledger.lock().unwrap();
        let amount = transfer.amount.value();
        let from_key = ledger
            .wallets
            .iter()
            .find(|(_, w)| w.uid == transfer.from_user_id)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| Self::rejected("unknown source"))?;
        let to_key = ledger
            .wallets
            .iter()
            .find(|(_, w)| w.uid == transfer.to_user_id)
            .map(|(k, _)| k.clone())
            .ok_or_else(|| Self::rejected("unknown target"))?;

        let source = ledger.wallets.get_mut(&from_key).ok_or_else(|| Self::rejected("unknown source"))?;
        if source.spot + 1e-9 < amount {
            return Err(Self::rejected("insufficient balance"));
        }
        source.spot -= amount;
        if let Some(target) = ledger.wallets.get_mut(&to_key) {
            target.spot += amount;
        }
        ledger.transfers.push((
            transfer.from_user_id.clone(),
            transfer.to_user_id.clone(),
            amount,
        ));
        Ok(format!("tr-{}", ledger.transfers.len()))
    }
}

/// Accounts file with a main account and credentialed subs `(slot, uid)`
pub fn accounts_file(main_uid: &str, subs: &[(u32, &str)]) -> AccountsFile {
    let mut accounts = serde_json::Map::new();
    accounts.insert(
        "main".to_string(),
        serde_json::json!({"type": "main", "uuid": main_uid, "apikey": "main-key", "secret": "main-secret", "passphrase": "main-pass"}),
    );
    for (slot, uid) in subs {
        accounts.insert(
            slot.to_string(),
            serde_json::json!({"type": "sub", "uuid": uid, "apikey": format!("key-{}", uid), "secret": "s", "passphrase": "p"}),
        );
    }
    serde_json::from_value(serde_json::json!({ "accounts": accounts })).unwrap()
}

/// Context with every delay switched off
pub fn fast_context(exchange: Arc<FakeExchange>) -> AppContext {
    let config = AppConfig {
        target_subaccounts: 3,
        operation_delay: Duration::ZERO,
        transfer_delay: Duration::ZERO,
        apikey_delay: Duration::ZERO,
        settle_wait: Duration::ZERO,
        ..AppConfig::default()
    };
    AppContext::new(exchange, config, Arc::new(FixedIpResolver(None)))
}
