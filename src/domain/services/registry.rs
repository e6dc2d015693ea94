//! Account Registry - local slot numbering of the exchange's sub-accounts
//!
//! Sub-account slots are the contiguous `1..N` renumbering of the exchange's
//! sub-accounts sorted by ascending numeric uid. The exchange's own list order
//! is never used, so slots stay stable across runs. Credentials follow the
//! uid, not the slot, when the numbering changes.

use crate::domain::entities::account::{Account, AccountRole, SlotId};
use crate::domain::entities::accounts_file::{AccountRecord, AccountsFile};
use crate::domain::errors::ConfigError;
use crate::domain::repositories::exchange_gateway::VirtualSubAccount;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Where a uid landed after renumbering
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAssignment {
    pub slot: u32,
    pub uid: String,
    /// Credentials were carried over from an earlier slot
    pub kept_credentials: bool,
}

/// Numeric uids ascending; non-numeric uids after them, lexicographically
fn compare_uids(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u128>(), b.trim().parse::<u128>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// The sub-accounts that get slots: sorted by uid, then capped at `target_count`
pub fn slotted_subaccounts(
    exchange_subaccounts: &[VirtualSubAccount],
    target_count: usize,
) -> Vec<VirtualSubAccount> {
    let mut sorted = exchange_subaccounts.to_vec();
    sorted.sort_by(|a, b| compare_uids(&a.uid, &b.uid));
    sorted.truncate(target_count);
    sorted
}

/// True when the local slots do not match the exchange's sorted uid list
pub fn needs_update(
    exchange_subaccounts: &[VirtualSubAccount],
    local: &AccountsFile,
    target_count: usize,
) -> bool {
    let expected = slotted_subaccounts(exchange_subaccounts, target_count);
    let local_subs = local.sub_records();

    if local_subs.len() != expected.len() {
        return true;
    }

    expected.iter().enumerate().any(|(i, sub)| {
        let slot = (i + 1) as u32;
        match local_subs.get(&slot) {
            Some(record) => record.uuid != sub.uid,
            None => true,
        }
    })
}

/// Rebuild sub-account slots `1..N` from the exchange list.
///
/// Old slot ids are discarded; credentials are re-attached by uid. New uids
/// get a record with empty credential fields. The main record is untouched.
pub fn apply_update(
    exchange_subaccounts: &[VirtualSubAccount],
    file: &mut AccountsFile,
    target_count: usize,
) -> Vec<SlotAssignment> {
    let previous: HashMap<String, AccountRecord> = file
        .accounts
        .iter()
        .filter(|(_, record)| record.role == AccountRole::Sub && !record.uuid.is_empty())
        .map(|(_, record)| (record.uuid.clone(), record.clone()))
        .collect();

    file.accounts
        .retain(|_, record| record.role != AccountRole::Sub);

    let mut assignments = Vec::new();
    for (i, sub) in slotted_subaccounts(exchange_subaccounts, target_count)
        .iter()
        .enumerate()
    {
        let slot = (i + 1) as u32;
        let (record, kept_credentials) = match previous.get(&sub.uid) {
            Some(existing) => (existing.clone(), existing.has_api_key()),
            None => (AccountRecord::sub(&sub.uid), false),
        };

        tracing::info!(
            slot = slot,
            uid = %sub.uid,
            kept_credentials = kept_credentials,
            "Assigned sub-account slot"
        );

        file.accounts.insert(SlotId::Sub(slot).key(), record);
        assignments.push(SlotAssignment {
            slot,
            uid: sub.uid.clone(),
            kept_credentials,
        });
    }

    assignments
}

/// In-memory view of the configured accounts
#[derive(Debug, Clone)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    pub fn from_file(file: &AccountsFile) -> Result<Self, ConfigError> {
        let accounts = file.to_accounts();
        if !accounts.iter().any(|a| a.is_main()) {
            return Err(ConfigError::MissingMainAccount);
        }
        Ok(Self { accounts })
    }

    pub fn main(&self) -> &Account {
        // from_file guarantees a main account
        &self.accounts[0]
    }

    pub fn subs(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|a| !a.is_main())
    }

    pub fn all(&self) -> &[Account] {
        &self.accounts
    }

    /// Accounts that can sign requests, main first
    pub fn credentialed(&self) -> Vec<Account> {
        self.accounts
            .iter()
            .filter(|a| a.has_credentials())
            .cloned()
            .collect()
    }

    /// Sub-accounts still waiting for an API key
    pub fn missing_api_keys(&self) -> Vec<Account> {
        self.subs().filter(|a| !a.has_credentials()).cloned().collect()
    }

    pub fn main_credentials(&self) -> Result<&crate::secrets::ApiCredentials, ConfigError> {
        self.main()
            .credentials
            .as_ref()
            .ok_or_else(|| ConfigError::MissingCredentials(SlotId::Main.key()))
    }
}
