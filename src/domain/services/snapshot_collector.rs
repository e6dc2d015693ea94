//! SnapshotCollector - reads the balances a planning round needs
//!
//! Accounts are visited one after another. For savings, the three reads for
//! one account (holding, wallet, subscribe info) run concurrently and are
//! joined before moving on to the next account.

use crate::domain::entities::account::Account;
use crate::domain::entities::product::Product;
use crate::domain::entities::snapshot::{AccountSnapshot, SnapshotSet};
use crate::domain::repositories::exchange_gateway::ExchangeGateway;
use std::sync::Arc;

pub struct SnapshotCollector {
    gateway: Arc<dyn ExchangeGateway>,
}

impl SnapshotCollector {
    pub fn new(gateway: Arc<dyn ExchangeGateway>) -> Self {
        Self { gateway }
    }

    /// Savings holding, spot wallet and subscribe limits for each account
    pub async fn collect_savings(&self, accounts: &[Account], product: &Product) -> SnapshotSet {
        let mut snapshots = Vec::with_capacity(accounts.len());

        for account in accounts {
            let Some(credentials) = account.credentials.as_ref() else {
                tracing::warn!(slot = %account.slot_id, "Account has no credentials, skipping query");
                snapshots.push(AccountSnapshot::failed(account.clone()));
                continue;
            };

            let (holding, balance, info) = tokio::join!(
                self.gateway.savings_holding(credentials, product),
                self.gateway.spot_balance(credentials, &product.coin),
                self.gateway.subscribe_info(credentials, product),
            );

            let mut query_ok = true;
            let holding = holding.unwrap_or_else(|e| {
                tracing::warn!(slot = %account.slot_id, "Savings holding query failed: {}", e);
                query_ok = false;
                0.0
            });
            let balance = balance.unwrap_or_else(|e| {
                tracing::warn!(slot = %account.slot_id, "Spot balance query failed: {}", e);
                query_ok = false;
                Default::default()
            });
            let info = match info {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::warn!(slot = %account.slot_id, "Subscribe info query failed: {}", e);
                    query_ok = false;
                    None
                }
            };

            let mut snapshot =
                AccountSnapshot::new(account.clone(), holding, balance.available, balance.frozen);
            snapshot.subscribe_info = info;
            snapshot.query_ok = query_ok;

            tracing::debug!(
                slot = %account.slot_id,
                holding = snapshot.product_holding,
                available = snapshot.wallet_available,
                query_ok = query_ok,
                "Collected savings snapshot"
            );
            snapshots.push(snapshot);
        }

        snapshots.into_iter().collect()
    }

    /// Spot wallet balances of `coin` for each account
    pub async fn collect_wallets(&self, accounts: &[Account], coin: &str) -> SnapshotSet {
        let mut snapshots = Vec::with_capacity(accounts.len());

        for account in accounts {
            let Some(credentials) = account.credentials.as_ref() else {
                tracing::warn!(slot = %account.slot_id, "Account has no credentials, skipping query");
                snapshots.push(AccountSnapshot::failed(account.clone()));
                continue;
            };

            match self.gateway.spot_balance(credentials, coin).await {
                Ok(balance) => snapshots.push(AccountSnapshot::new(
                    account.clone(),
                    0.0,
                    balance.available,
                    balance.frozen,
                )),
                Err(e) => {
                    tracing::warn!(slot = %account.slot_id, coin = coin, "Spot balance query failed: {}", e);
                    snapshots.push(AccountSnapshot::failed(account.clone()));
                }
            }
        }

        snapshots.into_iter().collect()
    }
}
