//! Savings product and its interest-rate tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier maxima at or above this value mean "no upper bound"
pub const UNBOUNDED_TIER_MAX: f64 = 1.2e8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Flexible,
    Fixed,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodType::Flexible => "flexible",
            PeriodType::Fixed => "fixed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flexible" => Some(PeriodType::Flexible),
            "fixed" => Some(PeriodType::Fixed),
            _ => None,
        }
    }
}

/// A balance band with its own annual rate
#[derive(Debug, Clone, PartialEq)]
pub struct Tier {
    /// 1-based position after sorting by `min_amount`
    pub index: usize,
    pub min_amount: f64,
    pub max_amount: f64,
    pub annual_rate_pct: f64,
}

impl Tier {
    pub fn is_unbounded(&self) -> bool {
        self.max_amount >= UNBOUNDED_TIER_MAX
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub product_id: String,
    pub coin: String,
    pub period_type: PeriodType,
    pub period_days: Option<u32>,
    /// Marketing level such as "beginner"; "normal" when absent
    pub level: String,
    pub apy_type: String,
    pub tiers: Vec<Tier>,
}

impl Product {
    /// Build a product, ordering tiers by ascending `min_amount` and renumbering them
    pub fn new(
        product_id: &str,
        coin: &str,
        period_type: PeriodType,
        period_days: Option<u32>,
        mut tiers: Vec<Tier>,
    ) -> Self {
        tiers.sort_by(|a, b| a.min_amount.total_cmp(&b.min_amount));
        for (i, tier) in tiers.iter_mut().enumerate() {
            tier.index = i + 1;
        }

        Self {
            product_id: product_id.to_string(),
            coin: coin.to_string(),
            period_type,
            period_days,
            level: "normal".to_string(),
            apy_type: String::new(),
            tiers,
        }
    }

    /// Upper bound of the first tier, the rebalancing ceiling
    pub fn tier1_ceiling(&self) -> Option<f64> {
        self.tiers.first().map(|tier| tier.max_amount)
    }

    pub fn has_multiple_tiers(&self) -> bool {
        self.tiers.len() >= 2
    }

    pub fn tier(&self, index: usize) -> Option<&Tier> {
        index.checked_sub(1).and_then(|i| self.tiers.get(i))
    }

    pub fn label(&self) -> String {
        match (self.period_type, self.period_days) {
            (PeriodType::Flexible, _) => "Flexible".to_string(),
            (PeriodType::Fixed, Some(days)) => format!("{}-day fixed", days),
            (PeriodType::Fixed, None) => "Fixed".to_string(),
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (ID: {})", self.coin, self.label(), self.product_id)
    }
}
