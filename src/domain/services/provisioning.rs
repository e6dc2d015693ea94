//! Provisioning - sub-account creation, slot sync and API key issuance
//!
//! The accounts file is loaded once by the caller, mutated in memory here and
//! saved once per logical update.

use crate::domain::entities::account::SlotId;
use crate::domain::entities::accounts_file::AccountsFile;
use crate::domain::errors::{ConfigError, WorkflowError};
use crate::domain::repositories::config_repository::ConfigRepository;
use crate::domain::repositories::exchange_gateway::{
    ApiKeyRequest, ExchangeGateway, SubAccountFailure, VirtualSubAccount,
};
use crate::domain::services::registry::{apply_update, needs_update, SlotAssignment};
use crate::secrets::{generate_api_passphrase, generate_subaccount_name, ApiCredentials};
use std::sync::Arc;
use std::time::Duration;

/// Permissions granted to every issued sub-account key
pub const SUBACCOUNT_KEY_PERMISSIONS: [&str; 3] = ["transfer", "read", "spot_trade"];

pub fn key_label(slot: u32) -> String {
    format!("auto_sub{}", slot)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncSummary {
    /// Sub-accounts on the exchange before any were created
    pub existing: usize,
    pub created: Vec<VirtualSubAccount>,
    pub failed: Vec<SubAccountFailure>,
    /// Slots were renumbered and the file saved
    pub renumbered: bool,
    pub assignments: Vec<SlotAssignment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyIssuanceSummary {
    pub issued: Vec<u32>,
    pub failed: Vec<(u32, String)>,
}

impl KeyIssuanceSummary {
    pub fn attempted(&self) -> usize {
        self.issued.len() + self.failed.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    Complete,
    /// Sub-accounts are in place but some keys could not be issued
    Partial,
    Failed,
}

impl ProvisioningOutcome {
    pub fn from_keys(summary: &KeyIssuanceSummary) -> Self {
        match (summary.issued.len(), summary.failed.len()) {
            (_, 0) => ProvisioningOutcome::Complete,
            (0, _) => ProvisioningOutcome::Failed,
            _ => ProvisioningOutcome::Partial,
        }
    }
}

/// Main-account credentials from the file
pub fn main_credentials(file: &AccountsFile) -> Result<ApiCredentials, ConfigError> {
    file.main_record()
        .ok_or(ConfigError::MissingMainAccount)?
        .credentials()
        .ok_or_else(|| ConfigError::MissingCredentials(SlotId::Main.key()))
}

/// Sub slots still lacking an API key, with their uids
pub fn pending_api_keys(file: &AccountsFile) -> Vec<(u32, String)> {
    file.sub_records()
        .into_iter()
        .filter(|(_, record)| !record.has_api_key())
        .map(|(slot, record)| (slot, record.uuid.clone()))
        .collect()
}

pub struct ProvisioningService {
    gateway: Arc<dyn ExchangeGateway>,
    repository: Arc<dyn ConfigRepository>,
    target_count: usize,
    key_pacing: Duration,
}

impl ProvisioningService {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        repository: Arc<dyn ConfigRepository>,
        target_count: usize,
        key_pacing: Duration,
    ) -> Self {
        Self {
            gateway,
            repository,
            target_count,
            key_pacing,
        }
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// Top the exchange up to the target count and renumber local slots
    pub async fn sync_subaccounts(&self, file: &mut AccountsFile) -> Result<SyncSummary, WorkflowError> {
        let main = main_credentials(file)?;
        let mut subaccounts = self.gateway.list_virtual_subaccounts(&main).await?;
        let mut summary = SyncSummary {
            existing: subaccounts.len(),
            ..Default::default()
        };

        tracing::info!(
            existing = subaccounts.len(),
            target = self.target_count,
            "Listed virtual sub-accounts"
        );

        if subaccounts.len() < self.target_count {
            let names: Vec<String> = (subaccounts.len()..self.target_count)
                .map(|_| generate_subaccount_name())
                .collect();
            let creation = self.gateway.create_virtual_subaccounts(&main, &names).await?;
            for failure in &creation.failed {
                tracing::warn!(name = %failure.name, "Sub-account creation failed: {}", failure.reason);
            }
            summary.created = creation.created;
            summary.failed = creation.failed;
            subaccounts = self.gateway.list_virtual_subaccounts(&main).await?;
        }

        if needs_update(&subaccounts, file, self.target_count) {
            summary.assignments = apply_update(&subaccounts, file, self.target_count);
            self.repository.save(file)?;
            summary.renumbered = true;
            tracing::info!(
                slots = summary.assignments.len(),
                location = %self.repository.location(),
                "Accounts file updated"
            );
        }

        Ok(summary)
    }

    /// Issue keys for every pending slot, one at a time, then save once.
    ///
    /// `observer(slot, result)` is told about each attempt as it completes.
    pub async fn issue_api_keys(
        &self,
        file: &mut AccountsFile,
        ip_list: &[String],
        observer: &mut dyn FnMut(u32, Result<&str, &str>),
    ) -> Result<KeyIssuanceSummary, WorkflowError> {
        let main = main_credentials(file)?;
        let pending = pending_api_keys(file);
        let mut summary = KeyIssuanceSummary::default();

        for (i, (slot, uid)) in pending.iter().enumerate() {
            if i > 0 && !self.key_pacing.is_zero() {
                tokio::time::sleep(self.key_pacing).await;
            }

            let passphrase = generate_api_passphrase();
            let request = ApiKeyRequest {
                sub_account_uid: uid.clone(),
                passphrase: passphrase.as_str().to_string(),
                label: key_label(*slot),
                permissions: SUBACCOUNT_KEY_PERMISSIONS
                    .iter()
                    .map(|p| p.to_string())
                    .collect(),
                ip_list: ip_list.to_vec(),
            };

            match self.gateway.create_subaccount_api_key(&main, &request).await {
                Ok(issued) => {
                    if let Some(record) = file.accounts.get_mut(&SlotId::Sub(*slot).key()) {
                        record.set_credentials(&issued.api_key, &issued.secret_key, passphrase.as_str());
                    }
                    tracing::info!(slot = slot, uid = %uid, "Issued sub-account API key");
                    observer(*slot, Ok(issued.api_key.as_str()));
                    summary.issued.push(*slot);
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(slot = slot, uid = %uid, "API key issuance failed: {}", message);
                    observer(*slot, Err(message.as_str()));
                    summary.failed.push((*slot, message));
                }
            }
        }

        if !summary.issued.is_empty() {
            self.repository.save(file)?;
        }

        Ok(summary)
    }
}

/// Main account uid from the file, or from the exchange when the file has none.
///
/// An answer without `userId` stops the workflow: the operator has to put
/// the uid into the accounts file by hand.
pub async fn ensure_main_uid(
    gateway: &dyn ExchangeGateway,
    repository: &dyn ConfigRepository,
    file: &mut AccountsFile,
) -> Result<String, WorkflowError> {
    let main = main_credentials(file)?;
    if let Some(record) = file.main_record() {
        if !record.uuid.trim().is_empty() {
            return Ok(record.uuid.trim().to_string());
        }
    }

    let info = gateway.account_info(&main).await?;
    let uid = info
        .user_id
        .filter(|uid| !uid.trim().is_empty())
        .ok_or_else(|| ConfigError::MainUidUnavailable {
            reason: "account info response carried no userId".to_string(),
        })?;

    if let Some(record) = file.main_record_mut() {
        record.uuid = uid.clone();
    }
    repository.save(file)?;
    tracing::info!(uid = %uid, "Stored main account uid");

    Ok(uid)
}
