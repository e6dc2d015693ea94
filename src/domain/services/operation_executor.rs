//! OperationExecutor - runs a planned batch against the exchange
//!
//! Operations run strictly one at a time, in plan order, with a fixed pause
//! between calls. A failed call is recorded and the batch moves on; nothing
//! is retried and nothing already executed is rolled back.

use crate::domain::entities::account::Account;
use crate::domain::entities::operation::{BatchReport, Operation, OperationOutcome, OperationResult};
use crate::domain::entities::product::Product;
use crate::domain::errors::GatewayResult;
use crate::domain::repositories::exchange_gateway::{ExchangeGateway, SubAccountTransfer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Ctrl-C state shared between the signal listener and a running batch
#[derive(Debug, Default)]
pub struct InterruptSignal {
    workflow_active: AtomicBool,
    batch_active: AtomicBool,
    requested: AtomicBool,
}

impl InterruptSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A menu workflow is talking to the operator
    pub fn begin_workflow(&self) {
        self.workflow_active.store(true, Ordering::SeqCst);
    }

    pub fn end_workflow(&self) {
        self.workflow_active.store(false, Ordering::SeqCst);
    }

    pub fn is_workflow_active(&self) -> bool {
        self.workflow_active.load(Ordering::SeqCst)
    }

    pub fn begin_batch(&self) {
        self.requested.store(false, Ordering::SeqCst);
        self.batch_active.store(true, Ordering::SeqCst);
    }

    pub fn end_batch(&self) {
        self.batch_active.store(false, Ordering::SeqCst);
    }

    pub fn is_batch_active(&self) -> bool {
        self.batch_active.load(Ordering::SeqCst)
    }

    /// Ask the running batch to stop; returns false when no batch is running
    pub fn request(&self) -> bool {
        self.requested.store(true, Ordering::SeqCst);
        self.is_batch_active()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// What the executor needs beyond the operations themselves
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub coin: String,
    /// Required for subscribe/redeem
    pub product: Option<Product>,
    /// Signs every transfer
    pub main: Account,
}

pub struct OperationExecutor {
    gateway: Arc<dyn ExchangeGateway>,
    pacing: Duration,
    interrupt: Option<Arc<InterruptSignal>>,
}

impl OperationExecutor {
    pub fn new(gateway: Arc<dyn ExchangeGateway>, pacing: Duration) -> Self {
        Self {
            gateway,
            pacing,
            interrupt: None,
        }
    }

    pub fn with_interrupt(mut self, interrupt: Arc<InterruptSignal>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    pub async fn execute(&self, context: &ExecutionContext, operations: &[Operation]) -> BatchReport {
        self.execute_observed(context, operations, &mut |_, _, _| {}).await
    }

    /// Execute the batch, calling `observer(position, total, result)` after each operation
    pub async fn execute_observed(
        &self,
        context: &ExecutionContext,
        operations: &[Operation],
        observer: &mut dyn FnMut(usize, usize, &OperationResult),
    ) -> BatchReport {
        let total = operations.len();
        let mut report = BatchReport::default();

        if let Some(interrupt) = &self.interrupt {
            interrupt.begin_batch();
        }

        for (i, operation) in operations.iter().enumerate() {
            if self.interrupted() {
                report.aborted = total - i;
                tracing::warn!(
                    executed = i,
                    aborted = report.aborted,
                    "Batch interrupted, remaining operations not started"
                );
                break;
            }

            if i > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            let outcome = match self.run(context, operation).await {
                Ok(id) => {
                    tracing::info!(
                        kind = operation.kind(),
                        slot = %operation.account().slot_id,
                        amount = operation.amount().value(),
                        id = %id,
                        "Operation succeeded"
                    );
                    OperationOutcome::Success(id)
                }
                Err(message) => {
                    tracing::warn!(
                        kind = operation.kind(),
                        slot = %operation.account().slot_id,
                        "Operation failed: {}",
                        message
                    );
                    OperationOutcome::Failure(message)
                }
            };

            let result = OperationResult {
                operation: operation.clone(),
                outcome,
            };
            observer(i + 1, total, &result);
            report.results.push(result);
        }

        if let Some(interrupt) = &self.interrupt {
            interrupt.end_batch();
        }

        tracing::info!(
            succeeded = report.success_count(),
            total = report.planned_count(),
            aborted = report.aborted,
            "Batch finished"
        );

        report
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .map(|i| i.is_requested())
            .unwrap_or(false)
    }

    /// Run one operation; failures of any kind come back as a message
    async fn run(&self, context: &ExecutionContext, operation: &Operation) -> Result<String, String> {
        match operation {
            Operation::Subscribe { account, amount } | Operation::Redeem { account, amount } => {
                let credentials = account
                    .credentials
                    .as_ref()
                    .ok_or_else(|| format!("{} has no API credentials", account.name()))?;
                let product = context
                    .product
                    .as_ref()
                    .ok_or_else(|| "No savings product selected".to_string())?;

                let result: GatewayResult<String> = match operation {
                    Operation::Subscribe { .. } => {
                        self.gateway.subscribe(credentials, product, *amount).await
                    }
                    _ => self.gateway.redeem(credentials, product, *amount).await,
                };
                result.map_err(|e| e.to_string())
            }
            Operation::TransferMainToSub { to_account, amount } => {
                self.transfer(context, &context.main, to_account, *amount).await
            }
            Operation::TransferSubToMain {
                from_account,
                amount,
            } => {
                self.transfer(context, from_account, &context.main, *amount)
                    .await
            }
        }
    }

    async fn transfer(
        &self,
        context: &ExecutionContext,
        from: &Account,
        to: &Account,
        amount: crate::domain::value_objects::amount::Amount,
    ) -> Result<String, String> {
        let main_credentials = context
            .main
            .credentials
            .as_ref()
            .ok_or_else(|| "Main account has no API credentials".to_string())?;
        for account in [from, to] {
            if !account.has_uid() {
                return Err(format!("{} has no uid in the accounts file", account.name()));
            }
        }

        let transfer = SubAccountTransfer::spot(
            &from.external_uid,
            &to.external_uid,
            &context.coin,
            amount,
        );
        self.gateway
            .subaccount_transfer(main_credentials, &transfer)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::product::PeriodType;
    use crate::domain::services::mock_gateway::{MockGateway, MockState};
    use crate::domain::value_objects::amount::Amount;
    use crate::secrets::ApiCredentials;

    fn main_account() -> Account {
        Account::main("1000", ApiCredentials::new("main", "secret", "pass"))
    }

    fn sub(slot: u32) -> Account {
        Account::sub(
            slot,
            &format!("{}", 1000 + slot),
            ApiCredentials::new(&format!("k{}", slot), "secret", "pass"),
        )
    }

    fn context() -> ExecutionContext {
        ExecutionContext {
            coin: "USDT".to_string(),
            product: Some(Product::new("p1", "USDT", PeriodType::Flexible, None, Vec::new())),
            main: main_account(),
        }
    }

    fn amount(value: f64) -> Amount {
        Amount::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_executes_in_plan_order_and_continues_after_failure() {
        let mut state = MockState::default();
        state.failing_writes.insert("k2".to_string());
        let gateway = Arc::new(MockGateway::with_state(state));
        let executor = OperationExecutor::new(gateway.clone(), Duration::ZERO);

        let operations = vec![
            Operation::Subscribe {
                account: sub(1),
                amount: amount(10.0),
            },
            Operation::Subscribe {
                account: sub(2),
                amount: amount(20.0),
            },
            Operation::Redeem {
                account: sub(3),
                amount: amount(5.0),
            },
        ];

        let report = executor.execute(&context(), &operations).await;
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert!(matches!(
            report.results[1].outcome,
            OperationOutcome::Failure(ref msg) if msg.contains("quota")
        ));
        assert_eq!(
            gateway.calls(),
            vec!["subscribe:k1:10", "subscribe:k2:20", "redeem:k3:5"]
        );
    }

    #[tokio::test]
    async fn test_transfers_use_main_uid_and_sub_uid() {
        let gateway = Arc::new(MockGateway::new());
        let executor = OperationExecutor::new(gateway.clone(), Duration::ZERO);

        let operations = vec![
            Operation::TransferMainToSub {
                to_account: sub(1),
                amount: amount(30.0),
            },
            Operation::TransferSubToMain {
                from_account: sub(2),
                amount: amount(4.5),
            },
        ];

        let report = executor.execute(&context(), &operations).await;
        assert_eq!(report.success_count(), 2);
        assert_eq!(
            gateway.calls(),
            vec!["transfer:1000->1001:30", "transfer:1002->1000:4.5"]
        );
    }

    #[tokio::test]
    async fn test_missing_main_uid_is_a_failure_outcome() {
        let gateway = Arc::new(MockGateway::new());
        let executor = OperationExecutor::new(gateway.clone(), Duration::ZERO);
        let mut ctx = context();
        ctx.main = Account::main("", ApiCredentials::new("main", "secret", "pass"));

        let report = executor
            .execute(
                &ctx,
                &[Operation::TransferMainToSub {
                    to_account: sub(1),
                    amount: amount(1.0),
                }],
            )
            .await;
        assert_eq!(report.failure_count(), 1);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_product_fails_savings_operations() {
        let gateway = Arc::new(MockGateway::new());
        let executor = OperationExecutor::new(gateway, Duration::ZERO);
        let mut ctx = context();
        ctx.product = None;

        let report = executor
            .execute(
                &ctx,
                &[Operation::Redeem {
                    account: sub(1),
                    amount: amount(1.0),
                }],
            )
            .await;
        assert_eq!(report.failure_count(), 1);
    }

    #[tokio::test]
    async fn test_interrupt_stops_before_next_operation() {
        let gateway = Arc::new(MockGateway::new());
        let interrupt = Arc::new(InterruptSignal::new());
        let executor =
            OperationExecutor::new(gateway.clone(), Duration::ZERO).with_interrupt(interrupt.clone());

        let operations: Vec<Operation> = (1..=4)
            .map(|slot| Operation::Subscribe {
                account: sub(slot),
                amount: amount(1.0),
            })
            .collect();

        let mut seen = Vec::new();
        let report = executor
            .execute_observed(&context(), &operations, &mut |position, total, _| {
                seen.push((position, total));
                if position == 2 {
                    interrupt.request();
                }
            })
            .await;

        assert_eq!(seen, vec![(1, 4), (2, 4)]);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.aborted, 2);
        assert!(report.was_interrupted());
        assert!(!interrupt.is_batch_active());
        assert_eq!(gateway.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_pacing_between_operations() {
        let gateway = Arc::new(MockGateway::new());
        let executor = OperationExecutor::new(gateway, Duration::from_millis(20));
        let operations: Vec<Operation> = (1..=3)
            .map(|slot| Operation::Subscribe {
                account: sub(slot),
                amount: amount(1.0),
            })
            .collect();

        let started = std::time::Instant::now();
        let report = executor.execute(&context(), &operations).await;
        assert_eq!(report.success_count(), 3);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
