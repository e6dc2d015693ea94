//! Plain-text tables for the terminal

use crate::domain::entities::operation::{
    total_amount, BatchReport, Operation, OperationOutcome, OperationResult,
};
use crate::domain::entities::product::Product;
use crate::domain::entities::snapshot::{AccountSnapshot, SnapshotSet};
use crate::domain::services::provisioning::SyncSummary;
use crate::domain::services::reconciliation::{
    HoldingChange, ReconciliationReport, TierClass, WalletReport,
};
use crate::domain::services::savings_planner::SkippedAccount;
use std::fmt::Write;

fn rule(width: usize) -> String {
    "-".repeat(width)
}

fn signed(value: f64) -> String {
    format!("{:+.6}", value)
}

fn tier_max(max_amount: f64, unbounded: bool) -> String {
    if unbounded {
        "unbounded".to_string()
    } else {
        format!("{:.2}", max_amount)
    }
}

pub fn products_table(products: &[Product]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<4} {:<22} {:<16} {:<10} {:>10}", "#", "Product ID", "Period", "Level", "Top APY");
    let _ = writeln!(out, "{}", rule(66));
    for (i, product) in products.iter().enumerate() {
        let top_rate = product
            .tiers
            .iter()
            .map(|t| t.annual_rate_pct)
            .fold(0.0_f64, f64::max);
        let _ = writeln!(
            out,
            "{:<4} {:<22} {:<16} {:<10} {:>9.2}%",
            i + 1,
            product.product_id,
            product.label(),
            product.level,
            top_rate
        );
    }
    out.trim_end().to_string()
}

pub fn tier_table(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rate tiers for {}", product);
    let _ = writeln!(out, "{:<6} {:>16} {:>16} {:>10}", "Tier", "From", "To", "APY");
    let _ = writeln!(out, "{}", rule(51));
    for tier in &product.tiers {
        let _ = writeln!(
            out,
            "{:<6} {:>16.2} {:>16} {:>9.2}%",
            tier.index,
            tier.min_amount,
            tier_max(tier.max_amount, tier.is_unbounded()),
            tier.annual_rate_pct
        );
    }
    out.trim_end().to_string()
}

/// Numbered savings overview; the numbers are the selection indices
pub fn savings_overview(snapshots: &[AccountSnapshot], tier1_ceiling: f64, coin: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<8} {:>16} {:>16} {:>16}",
        "#", "Account", "Holding", "Wallet", "Space to tier 1"
    );
    let _ = writeln!(out, "{}", rule(64));
    for (i, snapshot) in snapshots.iter().enumerate() {
        let marker = if snapshot.query_ok { "" } else { "  (query failed)" };
        let _ = writeln!(
            out,
            "{:<4} {:<8} {:>16.6} {:>16.6} {:>16.6}{}",
            i + 1,
            snapshot.account.name(),
            snapshot.product_holding,
            snapshot.wallet_available,
            snapshot.space_to(tier1_ceiling),
            marker
        );
    }
    let holding: f64 = snapshots.iter().map(|s| s.product_holding).sum();
    let wallet: f64 = snapshots.iter().map(|s| s.wallet_available).sum();
    let _ = writeln!(out, "{}", rule(64));
    let _ = write!(out, "{:<13} {:>16.6} {:>16.6}  {}", "Total", holding, wallet, coin);
    out
}

pub fn wallet_overview(snapshots: &SnapshotSet, coin: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<8} {:>16} {:>16} {:>16}", "Account", "Available", "Frozen", "Total");
    let _ = writeln!(out, "{}", rule(59));
    for snapshot in snapshots.iter() {
        let marker = if snapshot.query_ok { "" } else { "  (query failed)" };
        let _ = writeln!(
            out,
            "{:<8} {:>16.6} {:>16.6} {:>16.6}{}",
            snapshot.account.name(),
            snapshot.wallet_available,
            snapshot.wallet_frozen,
            snapshot.wallet_total(),
            marker
        );
    }
    let available: f64 = snapshots.iter().map(|s| s.wallet_available).sum();
    let frozen: f64 = snapshots.iter().map(|s| s.wallet_frozen).sum();
    let _ = writeln!(out, "{}", rule(59));
    let _ = write!(
        out,
        "{:<8} {:>16.6} {:>16.6} {:>16.6}  {}",
        "Total",
        available,
        frozen,
        available + frozen,
        coin
    );
    out
}

/// Numbered candidates for a transfer selection
pub fn candidate_list(candidates: &[AccountSnapshot], coin: &str) -> String {
    candidates
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{:>3}. {:<8} available {:.6} {}",
                i + 1,
                s.account.name(),
                s.wallet_available,
                coin
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn operation_plan(operations: &[Operation], coin: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Planned operations ({}):", operations.len());
    for (i, operation) in operations.iter().enumerate() {
        let _ = writeln!(out, "{:>3}. {}", i + 1, operation.describe(coin));
    }
    let _ = write!(out, "Total: {:.6} {}", total_amount(operations), coin);
    out
}

pub fn skipped_accounts(skipped: &[SkippedAccount], coin: &str) -> String {
    skipped
        .iter()
        .map(|s| {
            format!(
                "Skipping {}: deposit {:.6} {} is below the 0.1 minimum",
                s.slot.display_name(),
                s.deposit,
                coin
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn operation_line(position: usize, total: usize, result: &OperationResult, coin: &str) -> String {
    match &result.outcome {
        OperationOutcome::Success(id) => format!(
            "[{}/{}] OK   {} (id {})",
            position,
            total,
            result.operation.describe(coin),
            id
        ),
        OperationOutcome::Failure(message) => format!(
            "[{}/{}] FAIL {}: {}",
            position,
            total,
            result.operation.describe(coin),
            message
        ),
    }
}

pub fn batch_summary(report: &BatchReport) -> String {
    let mut line = format!(
        "Completed: {}/{} succeeded",
        report.success_count(),
        report.planned_count()
    );
    if report.failure_count() > 0 {
        let _ = write!(line, ", {} failed", report.failure_count());
    }
    if report.was_interrupted() {
        let _ = write!(line, ", {} not started (interrupted)", report.aborted);
    }
    line
}

pub fn reconciliation_table(report: &ReconciliationReport, coin: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Savings reconciliation for product {} ({})",
        report.product_id,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "{:<8} {:>14} {:>14} {:>14} {:<12} {:>14}",
        "Account", "Before", "After", "Change", "Result", "Wallet change"
    );
    let _ = writeln!(out, "{}", rule(81));
    for account in &report.accounts {
        let result = if account.query_failed {
            "query failed".to_string()
        } else {
            account.holding_change.to_string()
        };
        let _ = writeln!(
            out,
            "{:<8} {:>14.6} {:>14.6} {:>14} {:<12} {:>14}",
            account.slot.display_name(),
            account.holding_before,
            account.holding_after,
            signed(account.holding_delta),
            result,
            signed(account.wallet_delta)
        );
    }
    let _ = writeln!(out, "{}", rule(81));
    let _ = writeln!(
        out,
        "{:<8} {:>14.6} {:>14.6} {:>14}  {}",
        "Total",
        report.total_holding_before,
        report.total_holding_after,
        signed(report.total_holding_delta()),
        coin
    );
    let _ = write!(
        out,
        "Subscribed: {}  Redeemed: {}  Unchanged: {}",
        report.count(HoldingChange::Subscribed),
        report.count(HoldingChange::Redeemed),
        report.count(HoldingChange::Unchanged)
    );
    out
}

pub fn tier_analysis(report: &ReconciliationReport) -> String {
    let mut out = String::new();
    match report.tier1_ceiling {
        Some(ceiling) => {
            let _ = writeln!(out, "Tier analysis (tier 1 ceiling {:.2})", ceiling);
        }
        None => {
            let _ = writeln!(out, "Tier analysis");
        }
    }
    for account in &report.accounts {
        let note = match account.tier {
            TierClass::Tier2 => "  above the tier 1 ceiling",
            _ => "",
        };
        let _ = writeln!(
            out,
            "  {:<8} {:>14.6}  {}{}",
            account.slot.display_name(),
            account.holding_after,
            account.tier,
            note
        );
    }
    let occupancy = &report.occupancy;
    let _ = write!(
        out,
        "Tier 1: {}  Tier 2: {}  Not invested: {}",
        occupancy.tier1, occupancy.tier2, occupancy.not_invested
    );
    out
}

pub fn wallet_report(report: &WalletReport, coin: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Wallet reconciliation ({})",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(
        out,
        "{:<8} {:>14} {:>14} {:>14} {:<16}",
        "Account", "Before", "After", "Change", "Result"
    );
    let _ = writeln!(out, "{}", rule(70));
    for account in &report.accounts {
        let result = if account.query_failed {
            "query failed".to_string()
        } else {
            account.change.to_string()
        };
        let _ = writeln!(
            out,
            "{:<8} {:>14.6} {:>14.6} {:>14} {:<16}",
            account.slot.display_name(),
            account.before,
            account.after,
            signed(account.delta),
            result
        );
    }
    let _ = writeln!(out, "{}", rule(70));
    let _ = write!(
        out,
        "{:<8} {:>14.6} {:>14.6} {:>14}  {}",
        "Total",
        report.total_before,
        report.total_after,
        signed(report.net_change()),
        coin
    );
    out
}

pub fn sync_summary(summary: &SyncSummary, target: usize) -> String {
    let mut lines = vec![format!(
        "Sub-accounts on the exchange: {} (target {})",
        summary.existing, target
    )];
    if !summary.created.is_empty() {
        lines.push(format!("Created {} sub-account(s):", summary.created.len()));
        for account in &summary.created {
            lines.push(format!("  {} (uid {})", account.name, account.uid));
        }
    }
    for failure in &summary.failed {
        lines.push(format!("  Failed to create {}: {}", failure.name, failure.reason));
    }
    if summary.renumbered {
        lines.push("Accounts file updated:".to_string());
        for assignment in &summary.assignments {
            let keys = if assignment.kept_credentials {
                "credentials kept"
            } else {
                "needs API key"
            };
            lines.push(format!("  Slot {} -> uid {} ({})", assignment.slot, assignment.uid, keys));
        }
    } else {
        lines.push("Accounts file already matches the exchange".to_string());
    }
    lines.join("\n")
}
