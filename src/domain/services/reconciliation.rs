//! Reconciliation Reporter
//!
//! Diffs the snapshot taken before a batch against the one taken after it.
//! Every account present in the after-set gets a row; an account missing
//! from the before-set reads as zero there. Totals are sums of the row
//! figures, never sums of deltas.

use crate::domain::entities::account::SlotId;
use crate::domain::entities::product::Product;
use crate::domain::entities::snapshot::SnapshotSet;
use crate::domain::value_objects::amount::UNCHANGED_TOLERANCE;
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingChange {
    Unchanged,
    Subscribed,
    Redeemed,
}

impl HoldingChange {
    pub fn from_delta(delta: f64) -> Self {
        if delta.abs() < UNCHANGED_TOLERANCE {
            HoldingChange::Unchanged
        } else if delta > 0.0 {
            HoldingChange::Subscribed
        } else {
            HoldingChange::Redeemed
        }
    }
}

impl fmt::Display for HoldingChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Unchanged => "unchanged",
                Self::Subscribed => "subscribed",
                Self::Redeemed => "redeemed",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletChange {
    Unchanged,
    TransferredIn,
    TransferredOut,
}

impl WalletChange {
    pub fn from_delta(delta: f64) -> Self {
        if delta.abs() < UNCHANGED_TOLERANCE {
            WalletChange::Unchanged
        } else if delta > 0.0 {
            WalletChange::TransferredIn
        } else {
            WalletChange::TransferredOut
        }
    }
}

impl fmt::Display for WalletChange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Unchanged => "unchanged",
                Self::TransferredIn => "transferred in",
                Self::TransferredOut => "transferred out",
            }
        )
    }
}

/// Which rate tier an account's holding sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierClass {
    NotInvested,
    Tier1,
    /// Above the tier-1 ceiling of a product with more than one tier
    Tier2,
}

impl TierClass {
    /// Only an empty holding is not invested. A single-tier product has
    /// nowhere else to go, so any holding is tier 1
    pub fn classify(holding: f64, product: &Product) -> Self {
        if holding <= 0.0 {
            return TierClass::NotInvested;
        }
        match product.tier1_ceiling() {
            Some(ceiling) if holding > ceiling && product.has_multiple_tiers() => TierClass::Tier2,
            _ => TierClass::Tier1,
        }
    }
}

impl fmt::Display for TierClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::NotInvested => "not invested",
                Self::Tier1 => "tier 1",
                Self::Tier2 => "tier 2",
            }
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierOccupancy {
    pub tier1: usize,
    pub tier2: usize,
    pub not_invested: usize,
}

impl TierOccupancy {
    fn record(&mut self, class: TierClass) {
        match class {
            TierClass::NotInvested => self.not_invested += 1,
            TierClass::Tier1 => self.tier1 += 1,
            TierClass::Tier2 => self.tier2 += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountReconciliation {
    pub slot: SlotId,
    pub holding_before: f64,
    pub holding_after: f64,
    pub holding_delta: f64,
    pub holding_change: HoldingChange,
    pub wallet_before: f64,
    pub wallet_after: f64,
    pub wallet_delta: f64,
    pub tier: TierClass,
    /// The after-snapshot query for this account failed
    pub query_failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationReport {
    pub product_id: String,
    pub tier1_ceiling: Option<f64>,
    pub accounts: Vec<AccountReconciliation>,
    pub total_holding_before: f64,
    pub total_holding_after: f64,
    pub total_wallet_before: f64,
    pub total_wallet_after: f64,
    pub occupancy: TierOccupancy,
    pub generated_at: DateTime<Utc>,
}

impl ReconciliationReport {
    pub fn total_holding_delta(&self) -> f64 {
        self.total_holding_after - self.total_holding_before
    }

    pub fn total_wallet_delta(&self) -> f64 {
        self.total_wallet_after - self.total_wallet_before
    }

    pub fn account(&self, slot: SlotId) -> Option<&AccountReconciliation> {
        self.accounts.iter().find(|a| a.slot == slot)
    }

    pub fn count(&self, change: HoldingChange) -> usize {
        self.accounts
            .iter()
            .filter(|a| a.holding_change == change)
            .count()
    }
}

/// Compare savings snapshots taken around a batch
pub fn reconcile(before: &SnapshotSet, after: &SnapshotSet, product: &Product) -> ReconciliationReport {
    let mut accounts = Vec::with_capacity(after.len());
    let mut occupancy = TierOccupancy::default();

    for snapshot in after.iter() {
        let previous = before.get(&snapshot.slot());
        let holding_before = previous.map(|s| s.product_holding).unwrap_or(0.0);
        let wallet_before = previous.map(|s| s.wallet_available).unwrap_or(0.0);
        let holding_delta = snapshot.product_holding - holding_before;
        let tier = TierClass::classify(snapshot.product_holding, product);
        occupancy.record(tier);

        accounts.push(AccountReconciliation {
            slot: snapshot.slot(),
            holding_before,
            holding_after: snapshot.product_holding,
            holding_delta,
            holding_change: HoldingChange::from_delta(holding_delta),
            wallet_before,
            wallet_after: snapshot.wallet_available,
            wallet_delta: snapshot.wallet_available - wallet_before,
            tier,
            query_failed: !snapshot.query_ok,
        });
    }

    let report = ReconciliationReport {
        product_id: product.product_id.clone(),
        tier1_ceiling: product.tier1_ceiling(),
        total_holding_before: accounts.iter().map(|a| a.holding_before).sum(),
        total_holding_after: accounts.iter().map(|a| a.holding_after).sum(),
        total_wallet_before: accounts.iter().map(|a| a.wallet_before).sum(),
        total_wallet_after: accounts.iter().map(|a| a.wallet_after).sum(),
        accounts,
        occupancy,
        generated_at: Utc::now(),
    };

    tracing::info!(
        product_id = %report.product_id,
        accounts = report.accounts.len(),
        holding_delta = report.total_holding_delta(),
        "Savings reconciliation complete"
    );

    report
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletReconciliation {
    pub slot: SlotId,
    pub before: f64,
    pub after: f64,
    pub delta: f64,
    pub change: WalletChange,
    pub query_failed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletReport {
    pub accounts: Vec<WalletReconciliation>,
    pub total_before: f64,
    pub total_after: f64,
    pub generated_at: DateTime<Utc>,
}

impl WalletReport {
    pub fn net_change(&self) -> f64 {
        self.total_after - self.total_before
    }

    pub fn account(&self, slot: SlotId) -> Option<&WalletReconciliation> {
        self.accounts.iter().find(|a| a.slot == slot)
    }
}

/// Compare spot wallets around a transfer batch
pub fn reconcile_wallets(before: &SnapshotSet, after: &SnapshotSet) -> WalletReport {
    let accounts: Vec<WalletReconciliation> = after
        .iter()
        .map(|snapshot| {
            let previous = before
                .get(&snapshot.slot())
                .map(|s| s.wallet_available)
                .unwrap_or(0.0);
            let delta = snapshot.wallet_available - previous;
            WalletReconciliation {
                slot: snapshot.slot(),
                before: previous,
                after: snapshot.wallet_available,
                delta,
                change: WalletChange::from_delta(delta),
                query_failed: !snapshot.query_ok,
            }
        })
        .collect();

    WalletReport {
        total_before: accounts.iter().map(|a| a.before).sum(),
        total_after: accounts.iter().map(|a| a.after).sum(),
        accounts,
        generated_at: Utc::now(),
    }
}
