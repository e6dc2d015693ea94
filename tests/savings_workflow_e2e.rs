//! Savings rebalancing end to end: snapshot, plan, execute, reconcile

mod common;

use common::{accounts_file, fast_context, FakeExchange};
use flexman::application::handlers::savings_handler;
use flexman::application::prompt::ScriptedPrompter;
use flexman::domain::entities::account::SlotId;
use flexman::domain::services::reconciliation::{HoldingChange, TierClass};
use flexman::persistence::memory_store::MemoryConfigRepository;
use std::sync::Arc;

fn exchange() -> Arc<FakeExchange> {
    let exchange = Arc::new(FakeExchange::new(Some("100")));
    exchange.fund("main-key", "100", 0.0, 0.0);
    exchange.fund("key-201", "201", 500.0, 120.0);
    exchange.fund("key-202", "202", 40.0, 450.0);
    exchange.fund("key-203", "203", 0.05, 299.0);
    exchange
}

fn repository() -> Arc<MemoryConfigRepository> {
    Arc::new(MemoryConfigRepository::new(accounts_file(
        "100",
        &[(1, "201"), (2, "202"), (3, "203")],
    )))
}

#[tokio::test]
async fn test_fill_to_tier1_stops_at_ceiling() {
    let exchange = exchange();
    let context = fast_context(exchange.clone());
    let mut prompter = ScriptedPrompter::new(["usdt", "1", "0", "1", "y"]);

    let report = savings_handler::run(&context, repository(), &mut prompter)
        .await
        .unwrap()
        .unwrap();

    // Sub 1 fills the 180 gap; sub 2 is already above; sub 3's 0.05 is below the minimum
    assert_eq!(exchange.wallet("key-201").savings, 300.0);
    assert_eq!(exchange.wallet("key-201").spot, 320.0);
    assert_eq!(exchange.wallet("key-202").savings, 450.0);
    assert_eq!(exchange.wallet("key-203").savings, 299.0);

    let sub1 = report.account(SlotId::Sub(1)).unwrap();
    assert_eq!(sub1.holding_change, HoldingChange::Subscribed);
    assert_eq!(sub1.tier, TierClass::Tier1);
    assert_eq!(
        report.account(SlotId::Sub(3)).unwrap().holding_change,
        HoldingChange::Unchanged
    );
    assert!(prompter.transcript().contains("Skipping Sub 3"));
    assert!(prompter.transcript().contains("Completed: 1/1 succeeded"));
}

#[tokio::test]
async fn test_drain_to_tier1_redeems_only_excess() {
    let exchange = exchange();
    let context = fast_context(exchange.clone());
    let mut prompter = ScriptedPrompter::new(["USDT", "1", "0", "2", "y"]);

    let report = savings_handler::run(&context, repository(), &mut prompter)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(exchange.wallet("key-202").savings, 300.0);
    assert_eq!(exchange.wallet("key-202").spot, 190.0);
    assert_eq!(report.count(HoldingChange::Redeemed), 1);
    assert_eq!(report.occupancy.tier2, 0);
}

#[tokio::test]
async fn test_drain_all_leaves_every_selected_account_empty() {
    let exchange = exchange();
    let context = fast_context(exchange.clone());
    let mut prompter = ScriptedPrompter::new(["USDT", "1", "2,3,4", "3", "y"]);

    let report = savings_handler::run(&context, repository(), &mut prompter)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(report.accounts.len(), 3);
    assert!(report.accounts.iter().all(|a| a.holding_after == 0.0));
    assert_eq!(report.occupancy.not_invested, 3);
    assert_eq!(report.total_holding_after, 0.0);
    assert!((report.total_holding_before - 869.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_unknown_coin_has_nothing_to_manage() {
    let exchange = exchange();
    let context = fast_context(exchange);
    let mut prompter = ScriptedPrompter::new(["doge"]);

    let report = savings_handler::run(&context, repository(), &mut prompter)
        .await
        .unwrap();

    assert!(report.is_none());
    assert!(prompter.transcript().contains("No savings product is open for DOGE"));
}
