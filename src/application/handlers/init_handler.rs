//! "Initialize" menu entry: sub-accounts and their API keys

use crate::application::handlers::AppContext;
use crate::application::prompt::{confirm_default_yes, Prompter};
use crate::application::render;
use crate::domain::errors::WorkflowError;
use crate::domain::repositories::config_repository::ConfigRepository;
use crate::domain::services::provisioning::{
    pending_api_keys, ProvisioningOutcome, ProvisioningService,
};
use std::sync::Arc;

pub async fn run(
    context: &AppContext,
    repository: Arc<dyn ConfigRepository>,
    prompter: &mut dyn Prompter,
) -> Result<ProvisioningOutcome, WorkflowError> {
    let mut file = repository.load()?;
    prompter.say(&format!("Loaded accounts from {}", repository.location()));

    let service = ProvisioningService::new(
        context.gateway.clone(),
        repository.clone(),
        context.config.target_subaccounts,
        context.config.apikey_delay,
    );

    let summary = service.sync_subaccounts(&mut file).await?;
    prompter.say(&render::sync_summary(&summary, service.target_count()));

    let pending = pending_api_keys(&file);
    if pending.is_empty() {
        prompter.say("Every sub-account already has an API key.");
        return Ok(ProvisioningOutcome::Complete);
    }
    prompter.say(&format!("{} sub-account(s) need an API key.", pending.len()));

    let ip_list = if confirm_default_yes(
        prompter,
        "Bind the new keys to this machine's public IP? (Y/n): ",
    )? {
        match context.ip_resolver.public_ip().await {
            Some(ip) => {
                prompter.say(&format!("Binding keys to {}", ip));
                vec![ip]
            }
            None => {
                prompter.say("Could not determine the public IP; keys will not be IP-bound.");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let keys = service
        .issue_api_keys(&mut file, &ip_list, &mut |slot, result| match result {
            Ok(api_key) => prompter.say(&format!("  Sub {}: key {} issued", slot, api_key)),
            Err(message) => prompter.say(&format!("  Sub {}: failed ({})", slot, message)),
        })
        .await?;

    prompter.say(&format!(
        "API keys issued: {}/{}",
        keys.issued.len(),
        keys.attempted()
    ));

    let outcome = ProvisioningOutcome::from_keys(&keys);
    prompter.say(match outcome {
        ProvisioningOutcome::Complete => "Initialization complete.",
        ProvisioningOutcome::Partial => "Initialization partly complete; run it again to retry the failed keys.",
        ProvisioningOutcome::Failed => "No API key could be issued.",
    });
    Ok(outcome)
}
