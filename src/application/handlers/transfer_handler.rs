//! "Manage transfers" menu entry: moves between main and sub-accounts

use crate::application::handlers::{settle, AppContext};
use crate::application::prompt::{ask_amount, ask_choice, ask_coin, confirm, Prompter};
use crate::application::render;
use crate::domain::entities::account::Account;
use crate::domain::entities::snapshot::AccountSnapshot;
use crate::domain::errors::{PlanError, WorkflowError};
use crate::domain::repositories::config_repository::ConfigRepository;
use crate::domain::services::operation_executor::{ExecutionContext, OperationExecutor};
use crate::domain::services::provisioning::ensure_main_uid;
use crate::domain::services::reconciliation::{reconcile_wallets, WalletReport};
use crate::domain::services::registry::AccountRegistry;
use crate::domain::services::selection::select;
use crate::domain::services::snapshot_collector::SnapshotCollector;
use crate::domain::services::transfer_planner::{
    drain_candidates, fixed_amount_candidates, main_to_sub_candidates, plan_transfer,
    TransferDirection, TransferIntent, TransferPlan,
};
use std::sync::Arc;

fn choose_targets(
    prompter: &mut dyn Prompter,
    candidates: &[AccountSnapshot],
    coin: &str,
) -> Result<Vec<AccountSnapshot>, WorkflowError> {
    prompter.say(&render::candidate_list(candidates, coin));
    let answer = prompter.ask("Accounts (0 = all, N, or N,M,...): ")?;
    Ok(select(&answer, candidates)?)
}

/// Returns the wallet reconciliation of the executed batch, or `None` when nothing ran
pub async fn run(
    context: &AppContext,
    repository: Arc<dyn ConfigRepository>,
    prompter: &mut dyn Prompter,
) -> Result<Option<WalletReport>, WorkflowError> {
    let mut file = repository.load()?;
    let main_uid = ensure_main_uid(context.gateway.as_ref(), repository.as_ref(), &mut file).await?;
    let registry = AccountRegistry::from_file(&file)?;
    prompter.say(&format!("Main account uid: {}", main_uid));

    let coin = ask_coin(prompter)?;
    let accounts: Vec<Account> = registry.all().to_vec();
    let collector = SnapshotCollector::new(context.gateway.clone());
    let before = collector.collect_wallets(&accounts, &coin).await;
    prompter.say(&render::wallet_overview(&before, &coin));

    let main_available = before.main().map(|s| s.wallet_available).unwrap_or(0.0);
    let snapshots = before.to_vec();

    prompter.say("1. Main account -> sub-accounts");
    prompter.say("2. Sub-accounts -> main account");
    let direction = match ask_choice(prompter, "Direction: ", 1, 2)? {
        1 => TransferDirection::MainToSub,
        _ => TransferDirection::SubToMain,
    };

    let intent = match direction {
        TransferDirection::MainToSub => {
            let per_account = ask_amount(prompter, "Amount per sub-account: ")?;
            let candidates = main_to_sub_candidates(&snapshots);
            if candidates.is_empty() {
                return Err(PlanError::NoSubAccounts.into());
            }
            let targets = choose_targets(prompter, &candidates, &coin)?;
            TransferIntent::MainToSub {
                per_account,
                targets: targets.into_iter().map(|s| s.account).collect(),
            }
        }
        TransferDirection::SubToMain => {
            prompter.say("1. Sweep each account's whole balance");
            prompter.say("2. A fixed amount from each account");
            match ask_choice(prompter, "Mode: ", 1, 2)? {
                1 => {
                    let candidates = drain_candidates(&snapshots);
                    if candidates.is_empty() {
                        return Err(PlanError::NoFundedSubAccounts.into());
                    }
                    let sources = choose_targets(prompter, &candidates, &coin)?;
                    TransferIntent::SubToMainAll { sources }
                }
                _ => {
                    let per_account = ask_amount(prompter, "Amount per sub-account: ")?;
                    let candidates = fixed_amount_candidates(&snapshots, per_account);
                    if candidates.is_empty() {
                        return Err(PlanError::NoEligibleAccounts(per_account.value()).into());
                    }
                    let sources = choose_targets(prompter, &candidates, &coin)?;
                    TransferIntent::SubToMainFixed {
                        per_account,
                        sources,
                    }
                }
            }
        }
    };

    let operations = match plan_transfer(intent, main_available)? {
        TransferPlan::Ready(operations) => operations,
        TransferPlan::Reduced(reduced) => {
            prompter.say(&format!(
                "Requested {:.6} {} for {} account(s) but main has {:.6} {}.",
                reduced.requested_total,
                coin,
                reduced.requested_targets,
                reduced.main_available,
                coin
            ));
            let question = format!(
                "Transfer to the first {} account(s) only? (y/n): ",
                reduced.affordable_targets
            );
            if !confirm(prompter, &question)? {
                prompter.say("Cancelled.");
                return Ok(None);
            }
            reduced.operations
        }
    };

    prompter.say(&render::operation_plan(&operations, &coin));
    if !confirm(prompter, "Execute? (y/n): ")? {
        prompter.say("Cancelled.");
        return Ok(None);
    }

    let execution = ExecutionContext {
        coin: coin.clone(),
        product: None,
        main: registry.main().clone(),
    };
    let executor = OperationExecutor::new(context.gateway.clone(), context.config.transfer_delay)
        .with_interrupt(context.interrupt.clone());
    let report = executor
        .execute_observed(&execution, &operations, &mut |position, total, result| {
            prompter.say(&render::operation_line(position, total, result, &coin))
        })
        .await;
    prompter.say(&render::batch_summary(&report));

    settle(prompter, context.config.settle_wait).await;

    let after = collector.collect_wallets(&accounts, &coin).await;
    let wallets = reconcile_wallets(&before, &after);
    prompter.say(&render::wallet_report(&wallets, &coin));
    Ok(Some(wallets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prompt::ScriptedPrompter;
    use crate::config::AppConfig;
    use crate::domain::entities::accounts_file::AccountsFile;
    use crate::domain::errors::ConfigError;
    use crate::domain::repositories::exchange_gateway::SpotBalance;
    use crate::domain::services::mock_gateway::{MockGateway, MockState};
    use crate::infrastructure::public_ip::FixedIpResolver;
    use crate::persistence::memory_store::MemoryConfigRepository;
    use std::time::Duration;

    fn accounts(main_uuid: &str) -> AccountsFile {
        let text = format!(
            r#"{{"accounts": {{
                "main": {{"type": "main", "uuid": "{}", "apikey": "mk", "secret": "ms", "passphrase": "mp"}},
                "1": {{"type": "sub", "uuid": "101", "apikey": "k1", "secret": "s1", "passphrase": "p1"}},
                "2": {{"type": "sub", "uuid": "102", "apikey": "k2", "secret": "s2", "passphrase": "p2"}},
                "3": {{"type": "sub", "uuid": "103", "apikey": "k3", "secret": "s3", "passphrase": "p3"}}
            }}}}"#,
            main_uuid
        );
        serde_json::from_str(&text).unwrap()
    }

    fn setup(
        main_uuid: &str,
        state: MockState,
    ) -> (Arc<MockGateway>, AppContext, Arc<MemoryConfigRepository>) {
        let gateway = Arc::new(MockGateway::with_state(state));
        let config = AppConfig {
            transfer_delay: Duration::ZERO,
            settle_wait: Duration::ZERO,
            ..AppConfig::default()
        };
        let context = AppContext::new(gateway.clone(), config, Arc::new(FixedIpResolver(None)));
        (gateway, context, Arc::new(MemoryConfigRepository::new(accounts(main_uuid))))
    }

    fn wallet(available: f64) -> SpotBalance {
        SpotBalance { available, frozen: 0.0 }
    }

    #[tokio::test]
    async fn test_reduced_plan_keeps_selection_order() {
        let state = MockState {
            balances: [("mk".to_string(), wallet(70.0))].into_iter().collect(),
            ..MockState::default()
        };
        let (gateway, context, repository) = setup("1", state);
        let mut prompter = ScriptedPrompter::new(["USDT", "1", "30", "3,1,2", "y", "y"]);

        run(&context, repository, &mut prompter).await.unwrap().unwrap();

        let transfers: Vec<String> = gateway
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("transfer"))
            .collect();
        assert_eq!(transfers, vec!["transfer:1->103:30", "transfer:1->101:30"]);
        assert!(prompter.transcript().contains("first 2 account(s)"));
    }

    #[tokio::test]
    async fn test_fixed_amount_skips_short_accounts() {
        let state = MockState {
            balances: [
                ("k1".to_string(), wallet(49.999999)),
                ("k2".to_string(), wallet(50.0)),
                ("k3".to_string(), wallet(80.0)),
            ]
            .into_iter()
            .collect(),
            ..MockState::default()
        };
        let (gateway, context, repository) = setup("1", state);
        let mut prompter = ScriptedPrompter::new(["USDT", "2", "2", "50", "0", "y"]);

        run(&context, repository, &mut prompter).await.unwrap().unwrap();

        let transfers: Vec<String> = gateway
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("transfer"))
            .collect();
        assert_eq!(transfers, vec!["transfer:102->1:50", "transfer:103->1:50"]);
    }

    #[tokio::test]
    async fn test_main_uid_fetched_and_saved() {
        let state = MockState {
            main_user_id: Some("777".to_string()),
            ..MockState::default()
        };
        let (_gateway, context, repository) = setup("", state);
        let mut prompter = ScriptedPrompter::new(["USDT", "1", "5"]);

        // Script ends at the target prompt, after the uid was stored
        let error = run(&context, repository.clone(), &mut prompter).await.unwrap_err();
        assert!(matches!(error, WorkflowError::Input(_)));
        assert_eq!(repository.load().unwrap().main_record().unwrap().uuid, "777");
    }

    #[tokio::test]
    async fn test_missing_main_uid_is_a_hard_stop() {
        let (gateway, context, repository) = setup("", MockState::default());
        let mut prompter = ScriptedPrompter::new(["USDT"]);

        let error = run(&context, repository.clone(), &mut prompter).await.unwrap_err();
        assert!(matches!(
            error,
            WorkflowError::Config(ConfigError::MainUidUnavailable { .. })
        ));
        assert_eq!(gateway.calls(), vec!["info".to_string()]);
        assert_eq!(repository.save_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_with_no_funded_accounts() {
        let (_gateway, context, repository) = setup("1", MockState::default());
        let mut prompter = ScriptedPrompter::new(["USDT", "2", "1"]);

        let error = run(&context, repository, &mut prompter).await.unwrap_err();
        assert!(matches!(error, WorkflowError::Plan(PlanError::NoFundedSubAccounts)));
    }
}
