//! Planned operations and their execution results

use crate::domain::entities::account::Account;
use crate::domain::value_objects::amount::Amount;

/// One write against the exchange.
///
/// Executing is not idempotent: replaying an operation duplicates the
/// subscription or transfer, so a plan is built from a fresh snapshot and
/// executed once.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Subscribe { account: Account, amount: Amount },
    Redeem { account: Account, amount: Amount },
    TransferMainToSub { to_account: Account, amount: Amount },
    TransferSubToMain { from_account: Account, amount: Amount },
}

impl Operation {
    /// The non-main account the operation is about
    pub fn account(&self) -> &Account {
        match self {
            Operation::Subscribe { account, .. } => account,
            Operation::Redeem { account, .. } => account,
            Operation::TransferMainToSub { to_account, .. } => to_account,
            Operation::TransferSubToMain { from_account, .. } => from_account,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Operation::Subscribe { amount, .. }
            | Operation::Redeem { amount, .. }
            | Operation::TransferMainToSub { amount, .. }
            | Operation::TransferSubToMain { amount, .. } => *amount,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Subscribe { .. } => "subscribe",
            Operation::Redeem { .. } => "redeem",
            Operation::TransferMainToSub { .. } => "main->sub",
            Operation::TransferSubToMain { .. } => "sub->main",
        }
    }

    pub fn describe(&self, coin: &str) -> String {
        match self {
            Operation::Subscribe { account, amount } => {
                format!("{}: subscribe {} {}", account.name(), amount, coin)
            }
            Operation::Redeem { account, amount } => {
                format!("{}: redeem {} {}", account.name(), amount, coin)
            }
            Operation::TransferMainToSub { to_account, amount } => {
                format!("Main -> {}: {} {}", to_account.name(), amount, coin)
            }
            Operation::TransferSubToMain {
                from_account,
                amount,
            } => format!("{} -> Main: {} {}", from_account.name(), amount, coin),
        }
    }
}

/// Sum of the amounts of a plan
pub fn total_amount(operations: &[Operation]) -> f64 {
    operations.iter().map(|op| op.amount().value()).sum()
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// Exchange accepted the request; carries its order or transfer id
    Success(String),
    Failure(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub operation: Operation,
    pub outcome: OperationOutcome,
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, OperationOutcome::Success(_))
    }
}

/// Results of one executed batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub results: Vec<OperationResult>,
    /// Planned operations never started because the batch was interrupted
    pub aborted: usize,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    pub fn planned_count(&self) -> usize {
        self.results.len() + self.aborted
    }

    pub fn was_interrupted(&self) -> bool {
        self.aborted > 0
    }
}
