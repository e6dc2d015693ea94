//! Transfer planner - moves between the main account and its sub-accounts
//!
//! Main -> sub plans never change the per-account amount to fit the main
//! balance. When the requested total is too large, the plan shrinks to the
//! first targets that fit, in the order they were selected, and the operator
//! decides whether to accept that.

use crate::domain::entities::account::Account;
use crate::domain::entities::operation::Operation;
use crate::domain::entities::snapshot::AccountSnapshot;
use crate::domain::errors::PlanError;
use crate::domain::services::savings_planner::PLAN_TOLERANCE;
use crate::domain::value_objects::amount::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    MainToSub,
    SubToMain,
}

impl TransferDirection {
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(TransferDirection::MainToSub),
            "2" => Some(TransferDirection::SubToMain),
            _ => None,
        }
    }
}

/// What the operator asked for
#[derive(Debug, Clone, PartialEq)]
pub enum TransferIntent {
    MainToSub {
        per_account: Amount,
        targets: Vec<Account>,
    },
    /// Sweep each source's whole available balance
    SubToMainAll { sources: Vec<AccountSnapshot> },
    SubToMainFixed {
        per_account: Amount,
        sources: Vec<AccountSnapshot>,
    },
}

/// Main -> sub plan cut down to the targets the main balance can cover
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedTransferPlan {
    pub requested_targets: usize,
    pub affordable_targets: usize,
    pub requested_total: f64,
    pub main_available: f64,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferPlan {
    Ready(Vec<Operation>),
    /// Needs the operator's consent before it runs
    Reduced(ReducedTransferPlan),
}

impl TransferPlan {
    pub fn operations(&self) -> &[Operation] {
        match self {
            TransferPlan::Ready(operations) => operations,
            TransferPlan::Reduced(reduced) => &reduced.operations,
        }
    }

    pub fn into_operations(self) -> Vec<Operation> {
        match self {
            TransferPlan::Ready(operations) => operations,
            TransferPlan::Reduced(reduced) => reduced.operations,
        }
    }
}

/// Every sub-account can receive from main
pub fn main_to_sub_candidates(snapshots: &[AccountSnapshot]) -> Vec<AccountSnapshot> {
    snapshots
        .iter()
        .filter(|s| !s.account.is_main())
        .cloned()
        .collect()
}

/// Sub-accounts with something to sweep
pub fn drain_candidates(snapshots: &[AccountSnapshot]) -> Vec<AccountSnapshot> {
    snapshots
        .iter()
        .filter(|s| !s.account.is_main() && s.wallet_available > 0.0)
        .cloned()
        .collect()
}

/// Sub-accounts holding at least `per_account`
pub fn fixed_amount_candidates(
    snapshots: &[AccountSnapshot],
    per_account: Amount,
) -> Vec<AccountSnapshot> {
    snapshots
        .iter()
        .filter(|s| !s.account.is_main() && covers(s.wallet_available, per_account))
        .cloned()
        .collect()
}

fn covers(balance: f64, amount: Amount) -> bool {
    balance + PLAN_TOLERANCE >= amount.value()
}

pub fn plan_transfer(intent: TransferIntent, main_available: f64) -> Result<TransferPlan, PlanError> {
    match intent {
        TransferIntent::MainToSub {
            per_account,
            targets,
        } => plan_main_to_sub(per_account, targets, main_available),
        TransferIntent::SubToMainAll { sources } => {
            let operations: Vec<Operation> = sources
                .into_iter()
                .filter(|s| s.wallet_available > 0.0)
                .filter_map(|s| {
                    Amount::new(s.wallet_available)
                        .ok()
                        .map(|amount| Operation::TransferSubToMain {
                            from_account: s.account,
                            amount,
                        })
                })
                .collect();
            if operations.is_empty() {
                return Err(PlanError::NoFundedSubAccounts);
            }
            Ok(TransferPlan::Ready(operations))
        }
        TransferIntent::SubToMainFixed {
            per_account,
            sources,
        } => {
            let operations: Vec<Operation> = sources
                .into_iter()
                .filter(|s| covers(s.wallet_available, per_account))
                .map(|s| Operation::TransferSubToMain {
                    from_account: s.account,
                    amount: per_account,
                })
                .collect();
            if operations.is_empty() {
                return Err(PlanError::NoEligibleAccounts(per_account.value()));
            }
            Ok(TransferPlan::Ready(operations))
        }
    }
}

fn plan_main_to_sub(
    per_account: Amount,
    targets: Vec<Account>,
    main_available: f64,
) -> Result<TransferPlan, PlanError> {
    if targets.is_empty() {
        return Err(PlanError::NoSubAccounts);
    }
    if main_available <= 0.0 {
        return Err(PlanError::EmptyMainBalance);
    }

    let requested_targets = targets.len();
    let requested_total = per_account.times(requested_targets);
    let to_operation = |account: Account| Operation::TransferMainToSub {
        to_account: account,
        amount: per_account,
    };

    if requested_total <= main_available + PLAN_TOLERANCE {
        return Ok(TransferPlan::Ready(
            targets.into_iter().map(to_operation).collect(),
        ));
    }

    let affordable_targets = ((main_available + PLAN_TOLERANCE) / per_account.value()).floor() as usize;
    if affordable_targets == 0 {
        return Err(PlanError::InsufficientMainBalance {
            available: main_available,
            per_account: per_account.value(),
        });
    }

    tracing::warn!(
        requested = requested_targets,
        affordable = affordable_targets,
        requested_total = requested_total,
        main_available = main_available,
        "Main balance covers only part of the transfer"
    );

    Ok(TransferPlan::Reduced(ReducedTransferPlan {
        requested_targets,
        affordable_targets,
        requested_total,
        main_available,
        operations: targets
            .into_iter()
            .take(affordable_targets)
            .map(to_operation)
            .collect(),
    }))
}
