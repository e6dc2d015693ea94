//! Account entity - main account or one of its virtual sub-accounts

use crate::secrets::ApiCredentials;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable local identifier of an account.
///
/// `Main` sorts before every sub-account slot; sub-account slots are the
/// contiguous `1..N` numbering derived from the exchange's uid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    Main,
    Sub(u32),
}

impl SlotId {
    pub const MAIN_KEY: &'static str = "main";

    /// Parse a key of the accounts file ("main", "1", "2", ...)
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        if key == Self::MAIN_KEY {
            return Some(SlotId::Main);
        }
        match key.parse::<u32>() {
            Ok(slot) if slot > 0 => Some(SlotId::Sub(slot)),
            _ => None,
        }
    }

    /// Key used in the accounts file
    pub fn key(&self) -> String {
        match self {
            SlotId::Main => Self::MAIN_KEY.to_string(),
            SlotId::Sub(slot) => slot.to_string(),
        }
    }

    /// Human readable name shown in tables
    pub fn display_name(&self) -> String {
        match self {
            SlotId::Main => "Main".to_string(),
            SlotId::Sub(slot) => format!("Sub {}", slot),
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Main,
    Sub,
}

impl AccountRole {
    pub fn name(&self) -> &str {
        match self {
            AccountRole::Main => "main",
            AccountRole::Sub => "sub",
        }
    }
}

/// A configured account with optional API credentials
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub slot_id: SlotId,
    pub role: AccountRole,
    /// Exchange-side uid; may be empty for a main account not yet resolved
    pub external_uid: String,
    pub credentials: Option<ApiCredentials>,
}

impl Account {
    pub fn main(external_uid: &str, credentials: Option<ApiCredentials>) -> Self {
        Self {
            slot_id: SlotId::Main,
            role: AccountRole::Main,
            external_uid: external_uid.to_string(),
            credentials,
        }
    }

    pub fn sub(slot: u32, external_uid: &str, credentials: Option<ApiCredentials>) -> Self {
        Self {
            slot_id: SlotId::Sub(slot),
            role: AccountRole::Sub,
            external_uid: external_uid.to_string(),
            credentials,
        }
    }

    pub fn is_main(&self) -> bool {
        self.role == AccountRole::Main
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn has_uid(&self) -> bool {
        !self.external_uid.trim().is_empty()
    }

    pub fn name(&self) -> String {
        self.slot_id.display_name()
    }
}
