//! Account snapshot entity - point-in-time read of one account's balances

use crate::domain::entities::account::{Account, SlotId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Subscription limits reported for an account and product
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubscribeInfo {
    pub single_min_amount: f64,
    pub single_max_amount: f64,
    pub remaining_amount: f64,
}

/// Balances of one account at the moment it was queried.
///
/// Never mutated after creation; a new planning round takes a new snapshot.
/// A failed query contributes zero balances and `query_ok == false`,
/// never an estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub account: Account,
    pub product_holding: f64,
    pub wallet_available: f64,
    pub wallet_frozen: f64,
    pub subscribe_info: Option<SubscribeInfo>,
    pub query_ok: bool,
    pub taken_at: DateTime<Utc>,
}

impl AccountSnapshot {
    pub fn new(account: Account, product_holding: f64, wallet_available: f64, wallet_frozen: f64) -> Self {
        Self {
            account,
            product_holding,
            wallet_available,
            wallet_frozen,
            subscribe_info: None,
            query_ok: true,
            taken_at: Utc::now(),
        }
    }

    /// Snapshot for an account whose queries failed
    pub fn failed(account: Account) -> Self {
        Self {
            query_ok: false,
            ..Self::new(account, 0.0, 0.0, 0.0)
        }
    }

    pub fn slot(&self) -> SlotId {
        self.account.slot_id
    }

    pub fn wallet_total(&self) -> f64 {
        self.wallet_available + self.wallet_frozen
    }

    /// Room left below `ceiling`, zero when already at or above it
    pub fn space_to(&self, ceiling: f64) -> f64 {
        (ceiling - self.product_holding).max(0.0)
    }
}

/// Snapshots of every queried account, keyed by slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotSet {
    snapshots: BTreeMap<SlotId, AccountSnapshot>,
}

impl SnapshotSet {
    pub fn get(&self, slot: &SlotId) -> Option<&AccountSnapshot> {
        self.snapshots.get(slot)
    }

    pub fn main(&self) -> Option<&AccountSnapshot> {
        self.snapshots.get(&SlotId::Main)
    }

    /// Sub-account snapshots in slot order
    pub fn subs(&self) -> Vec<AccountSnapshot> {
        self.snapshots
            .values()
            .filter(|snapshot| !snapshot.account.is_main())
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountSnapshot> {
        self.snapshots.values()
    }

    pub fn to_vec(&self) -> Vec<AccountSnapshot> {
        self.snapshots.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.snapshots.values().filter(|s| !s.query_ok).count()
    }
}

impl FromIterator<AccountSnapshot> for SnapshotSet {
    fn from_iter<I: IntoIterator<Item = AccountSnapshot>>(iter: I) -> Self {
        Self {
            snapshots: iter.into_iter().map(|s| (s.slot(), s)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_snapshot_has_zero_balances() {
        let snapshot = AccountSnapshot::failed(Account::sub(1, "1001", None));
        assert!(!snapshot.query_ok);
        assert_eq!(snapshot.product_holding, 0.0);
        assert_eq!(snapshot.wallet_total(), 0.0);
    }

    #[test]
    fn test_space_to_ceiling() {
        let below = AccountSnapshot::new(Account::sub(1, "1", None), 120.0, 0.0, 0.0);
        let above = AccountSnapshot::new(Account::sub(2, "2", None), 450.0, 0.0, 0.0);
        assert_eq!(below.space_to(300.0), 180.0);
        assert_eq!(above.space_to(300.0), 0.0);
    }

    #[test]
    fn test_snapshot_set_orders_by_slot() {
        let set: SnapshotSet = vec![
            AccountSnapshot::new(Account::sub(2, "2", None), 0.0, 1.0, 0.0),
            AccountSnapshot::new(Account::main("9", None), 0.0, 5.0, 0.0),
            AccountSnapshot::new(Account::sub(1, "1", None), 0.0, 2.0, 0.0),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 3);
        assert_eq!(set.main().unwrap().wallet_available, 5.0);
        let subs: Vec<SlotId> = set.subs().iter().map(|s| s.slot()).collect();
        assert_eq!(subs, vec![SlotId::Sub(1), SlotId::Sub(2)]);
    }
}
