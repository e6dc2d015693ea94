//! "Manage savings" menu entry: tier-aware subscribe/redeem across accounts

use crate::application::handlers::{settle, AppContext};
use crate::application::prompt::{ask_choice, ask_coin, confirm, Prompter};
use crate::application::render;
use crate::domain::entities::account::Account;
use crate::domain::entities::snapshot::SnapshotSet;
use crate::domain::errors::{ConfigError, PlanError, WorkflowError};
use crate::domain::repositories::config_repository::ConfigRepository;
use crate::domain::services::operation_executor::{ExecutionContext, OperationExecutor};
use crate::domain::services::reconciliation::{reconcile, ReconciliationReport};
use crate::domain::services::registry::AccountRegistry;
use crate::domain::services::savings_planner::{plan_savings, SavingsStrategy};
use crate::domain::services::selection::select;
use crate::domain::services::snapshot_collector::SnapshotCollector;
use std::sync::Arc;

/// Returns the reconciliation of the executed batch, or `None` when nothing ran
pub async fn run(
    context: &AppContext,
    repository: Arc<dyn ConfigRepository>,
    prompter: &mut dyn Prompter,
) -> Result<Option<ReconciliationReport>, WorkflowError> {
    let file = repository.load()?;
    let registry = AccountRegistry::from_file(&file)?;
    let main_credentials = registry.main_credentials()?.clone();

    let coin = ask_coin(prompter)?;
    let products = context
        .gateway
        .savings_products(&main_credentials, &coin)
        .await?;
    if products.is_empty() {
        prompter.say(&format!("No savings product is open for {}.", coin));
        return Ok(None);
    }

    prompter.say(&render::products_table(&products));
    let choice = ask_choice(prompter, "Product number: ", 1, products.len())?;
    let product = products[choice - 1].clone();
    prompter.say(&render::tier_table(&product));
    let ceiling = product.tier1_ceiling().ok_or(PlanError::NoTiers)?;

    let accounts = registry.credentialed();
    if accounts.is_empty() {
        return Err(ConfigError::NoUsableAccounts.into());
    }
    let collector = SnapshotCollector::new(context.gateway.clone());
    let before = collector.collect_savings(&accounts, &product).await;
    let candidates = before.to_vec();
    prompter.say(&render::savings_overview(&candidates, ceiling, &coin));
    if before.failed_count() > 0 {
        prompter.say(&format!(
            "Warning: {} account(s) could not be queried and count as empty.",
            before.failed_count()
        ));
    }

    let answer = prompter.ask("Accounts (0 = all, N, or N,M,...): ")?;
    let selected = select(&answer, &candidates)?;

    prompter.say("1. Fill every account up to the tier 1 ceiling");
    prompter.say("2. Redeem the excess above the tier 1 ceiling");
    prompter.say("3. Redeem everything");
    let strategy = SavingsStrategy::from_choice(&prompter.ask("Strategy: ")?)?;
    tracing::info!(
        coin = %coin,
        product_id = %product.product_id,
        strategy = ?strategy,
        accounts = selected.len(),
        "Planning savings batch"
    );

    let plan = plan_savings(strategy, ceiling, &selected);
    if !plan.skipped.is_empty() {
        prompter.say(&render::skipped_accounts(&plan.skipped, &coin));
    }
    if plan.is_empty() {
        prompter.say("Nothing to do.");
        return Ok(None);
    }

    prompter.say(&render::operation_plan(&plan.operations, &coin));
    if !confirm(prompter, "Execute? (y/n): ")? {
        prompter.say("Cancelled.");
        return Ok(None);
    }

    let execution = ExecutionContext {
        coin: coin.clone(),
        product: Some(product.clone()),
        main: registry.main().clone(),
    };
    let executor = OperationExecutor::new(context.gateway.clone(), context.config.operation_delay)
        .with_interrupt(context.interrupt.clone());
    let report = executor
        .execute_observed(&execution, &plan.operations, &mut |position, total, result| {
            prompter.say(&render::operation_line(position, total, result, &coin))
        })
        .await;
    prompter.say(&render::batch_summary(&report));

    settle(prompter, context.config.settle_wait).await;

    let selected_accounts: Vec<Account> = selected.iter().map(|s| s.account.clone()).collect();
    let before: SnapshotSet = selected.into_iter().collect();
    let after = collector.collect_savings(&selected_accounts, &product).await;
    let reconciliation = reconcile(&before, &after, &product);

    prompter.say(&render::reconciliation_table(&reconciliation, &coin));
    prompter.say(&render::tier_analysis(&reconciliation));
    Ok(Some(reconciliation))
}
