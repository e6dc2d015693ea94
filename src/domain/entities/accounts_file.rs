//! Accounts file model - the persisted `{ "accounts": { slot -> record } }` document

use crate::domain::entities::account::{Account, AccountRole, SlotId};
use crate::secrets::ApiCredentials;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One account entry as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(rename = "type")]
    pub role: AccountRole,
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub apikey: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub passphrase: String,
    /// Fields this tool does not know about are written back untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AccountRecord {
    pub fn sub(uuid: &str) -> Self {
        Self {
            role: AccountRole::Sub,
            uuid: uuid.to_string(),
            apikey: String::new(),
            secret: String::new(),
            passphrase: String::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn credentials(&self) -> Option<ApiCredentials> {
        ApiCredentials::new(&self.apikey, &self.secret, &self.passphrase)
    }

    pub fn has_api_key(&self) -> bool {
        !self.apikey.trim().is_empty()
    }

    pub fn set_credentials(&mut self, api_key: &str, secret: &str, passphrase: &str) {
        self.apikey = api_key.to_string();
        self.secret = secret.to_string();
        self.passphrase = passphrase.to_string();
    }
}

/// The whole accounts document, loaded and saved wholesale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsFile {
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountRecord>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AccountsFile {
    pub fn main_record(&self) -> Option<&AccountRecord> {
        self.accounts.get(SlotId::MAIN_KEY)
    }

    pub fn main_record_mut(&mut self) -> Option<&mut AccountRecord> {
        self.accounts.get_mut(SlotId::MAIN_KEY)
    }

    /// Sub-account records keyed by slot number
    pub fn sub_records(&self) -> BTreeMap<u32, &AccountRecord> {
        self.accounts
            .iter()
            .filter(|(_, record)| record.role == AccountRole::Sub)
            .filter_map(|(key, record)| match SlotId::parse(key) {
                Some(SlotId::Sub(slot)) => Some((slot, record)),
                _ => {
                    tracing::warn!("Ignoring sub-account record with invalid slot key '{}'", key);
                    None
                }
            })
            .collect()
    }

    /// Every record as a domain account, main first then slots ascending
    pub fn to_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .filter_map(|(key, record)| {
                let slot = SlotId::parse(key)?;
                match (slot, record.role) {
                    (SlotId::Main, AccountRole::Main) => {
                        Some(Account::main(&record.uuid, record.credentials()))
                    }
                    (SlotId::Sub(n), AccountRole::Sub) => {
                        Some(Account::sub(n, &record.uuid, record.credentials()))
                    }
                    _ => {
                        tracing::warn!("Record '{}' has a type that does not match its key", key);
                        None
                    }
                }
            })
            .collect();
        accounts.sort_by_key(|account| account.slot_id);
        accounts
    }
}
