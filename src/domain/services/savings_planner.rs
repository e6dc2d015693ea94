//! Tier-aware rebalancing planner
//!
//! Turns a set of savings snapshots and an operator-chosen strategy into an
//! ordered list of subscribe/redeem operations. Planning is pure: nothing
//! here talks to the exchange. An empty plan is a valid "nothing to do".

use crate::domain::entities::account::SlotId;
use crate::domain::entities::operation::Operation;
use crate::domain::entities::snapshot::AccountSnapshot;
use crate::domain::errors::InputError;
use crate::domain::value_objects::amount::{Amount, MIN_SUBSCRIBE_AMOUNT};

/// Slack for comparisons against values that went through decimal strings
pub const PLAN_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavingsStrategy {
    /// Subscribe wallet funds until each account reaches the tier-1 ceiling
    FillToTier1,
    /// Redeem whatever sits above the tier-1 ceiling
    DrainToTier1,
    /// Redeem the whole holding
    DrainAll,
}

impl SavingsStrategy {
    /// Menu choice `1`, `2` or `3`
    pub fn from_choice(choice: &str) -> Result<Self, InputError> {
        match choice.trim() {
            "1" => Ok(SavingsStrategy::FillToTier1),
            "2" => Ok(SavingsStrategy::DrainToTier1),
            "3" => Ok(SavingsStrategy::DrainAll),
            "" => Err(InputError::Empty),
            other => match other.parse::<usize>() {
                Ok(value) => Err(InputError::OutOfRange {
                    value,
                    min: 1,
                    max: 3,
                }),
                Err(_) => Err(InputError::NotANumber(other.to_string())),
            },
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SavingsStrategy::FillToTier1 => "Fill every account up to the tier-1 ceiling",
            SavingsStrategy::DrainToTier1 => "Redeem the excess above the tier-1 ceiling",
            SavingsStrategy::DrainAll => "Redeem everything",
        }
    }
}

/// Account left out of a fill plan because its deposit was below the minimum
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAccount {
    pub slot: SlotId,
    pub deposit: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavingsPlan {
    pub operations: Vec<Operation>,
    pub skipped: Vec<SkippedAccount>,
}

impl SavingsPlan {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Plan subscribe/redeem operations for the selected accounts, in their order
pub fn plan_savings(
    strategy: SavingsStrategy,
    tier1_ceiling: f64,
    selected_accounts: &[AccountSnapshot],
) -> SavingsPlan {
    let mut plan = SavingsPlan::default();

    for snapshot in selected_accounts {
        let holding = snapshot.product_holding;
        match strategy {
            SavingsStrategy::FillToTier1 => {
                let space = (tier1_ceiling - holding).max(0.0);
                let deposit = snapshot.wallet_available.min(space);
                if deposit >= MIN_SUBSCRIBE_AMOUNT - PLAN_TOLERANCE {
                    if let Ok(amount) = Amount::new(deposit) {
                        plan.operations.push(Operation::Subscribe {
                            account: snapshot.account.clone(),
                            amount,
                        });
                        continue;
                    }
                }
                tracing::debug!(
                    slot = %snapshot.slot(),
                    deposit = deposit,
                    "Skipping account below minimum subscribe amount"
                );
                plan.skipped.push(SkippedAccount {
                    slot: snapshot.slot(),
                    deposit: deposit.max(0.0),
                });
            }
            SavingsStrategy::DrainToTier1 => {
                let excess = holding - tier1_ceiling;
                if excess > PLAN_TOLERANCE {
                    if let Ok(amount) = Amount::new(excess) {
                        plan.operations.push(Operation::Redeem {
                            account: snapshot.account.clone(),
                            amount,
                        });
                    }
                }
            }
            SavingsStrategy::DrainAll => {
                if holding > 0.0 {
                    if let Ok(amount) = Amount::new(holding) {
                        plan.operations.push(Operation::Redeem {
                            account: snapshot.account.clone(),
                            amount,
                        });
                    }
                }
            }
        }
    }

    tracing::info!(
        strategy = ?strategy,
        ceiling = tier1_ceiling,
        operations = plan.operations.len(),
        skipped = plan.skipped.len(),
        "Savings plan built"
    );

    plan
}
