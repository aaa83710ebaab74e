use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::ItemId;
use crate::error::{EngineError, Result};
use crate::utils::sort::sort_by_score_desc;

/// Funding progress of one catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingRecord {
    pub item: ItemId,
    /// amount recorded on the item itself
    #[serde(default)]
    pub base_amount: i64,
    /// sum of completed payments
    #[serde(default)]
    pub paid_amount: i64,
    #[serde(default)]
    pub goal_amount: i64,
}

impl FundingRecord {
    pub fn new(item: impl Into<ItemId>, current_amount: i64, goal_amount: i64) -> Self {
        Self {
            item: item.into(),
            base_amount: current_amount,
            paid_amount: 0,
            goal_amount,
        }
    }

    #[inline]
    pub fn current_amount(&self) -> i64 {
        self.base_amount.saturating_add(self.paid_amount)
    }

    /// current / goal, 0 when the goal is not positive
    #[inline]
    pub fn success_rate(&self) -> f64 {
        if self.goal_amount <= 0 {
            return 0.0;
        }
        self.current_amount() as f64 / self.goal_amount as f64
    }

    /// rate as a rounded percentage clamped to [0, 100]
    /// `None` when the goal is not positive
    pub fn funding_percent(&self) -> Option<u8> {
        if self.goal_amount <= 0 {
            return None;
        }
        let p = (self.current_amount() as f64 * 100.0 / self.goal_amount as f64).round();
        Some(p.clamp(0.0, 100.0) as u8)
    }
}

/// Funding data for the catalog, keyed by item
///
/// Backs the "likely to succeed" ranking. It never mixes with similarity fusion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundingLedger {
    records: IndexMap<ItemId, FundingRecord>,
}

impl FundingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FundingRecord>,
    {
        let mut ledger = Self::new();
        for record in records {
            ledger.insert(record);
        }
        ledger
    }

    /// insert or replace
    pub fn insert(&mut self, record: FundingRecord) {
        if record.goal_amount <= 0 {
            warn!(item = %record.item, goal = record.goal_amount, "funding goal is not positive, rate will be 0");
        }
        self.records.insert(record.item.clone(), record);
    }

    pub fn get(&self, item: &ItemId) -> Option<&FundingRecord> {
        self.records.get(item)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn success_rate(&self, item: &ItemId) -> Result<f64> {
        self.records
            .get(item)
            .map(FundingRecord::success_rate)
            .ok_or_else(|| EngineError::UnknownIdentifier(item.to_string()))
    }

    /// Sort the given items by funding-success rate, best first
    /// Ties by ascending `ItemId`; repeated ids appear once.
    pub fn rank_by_success_rate(&self, items: &[ItemId]) -> Result<Vec<(ItemId, f64)>> {
        let unique: IndexSet<&ItemId> = items.iter().collect();
        let mut ranked = unique
            .into_iter()
            .map(|item| Ok((item.clone(), self.success_rate(item)?)))
            .collect::<Result<Vec<(ItemId, f64)>>>()?;
        sort_by_score_desc(&mut ranked);
        Ok(ranked)
    }
}
