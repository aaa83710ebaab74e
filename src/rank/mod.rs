pub mod funding;
pub mod fusion;

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::codec::ItemId;

/// Where a candidate score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// learned factor model
    Collaborative,
    /// description text similarity
    Text,
    /// image embedding similarity
    Image,
}

/// One scored item for one query
/// The score scale is local to its signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub item: ItemId,
    pub score: f64,
    pub signal: Signal,
}

/// Ranked candidate list produced by a single signal
#[derive(Clone, PartialEq)]
pub struct Hits {
    pub signal: Signal,
    /// (item, score), best first
    pub list: Vec<(ItemId, f64)>,
}

impl Hits {
    pub fn new(signal: Signal, list: Vec<(ItemId, f64)>) -> Self {
        Hits { signal, list }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn truncate(&mut self, k: usize) -> &mut Self {
        self.list.truncate(k);
        self
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.list.iter().map(|(id, _)| id)
    }

    pub fn candidates(&self) -> impl Iterator<Item = RankedCandidate> + '_ {
        self.list.iter().map(move |(item, score)| RankedCandidate {
            item: item.clone(),
            score: *score,
            signal: self.signal,
        })
    }
}

impl Debug for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            // 1 行 1 件
            writeln!(f, "Hits({:?}) [", self.signal)?;
            for (item, score) in &self.list {
                writeln!(f, "    {}: {:.6}", item, score)?;
            }
            write!(f, "]")
        } else {
            f.debug_struct("Hits")
                .field("signal", &self.signal)
                .field("list", &self.list)
                .finish()
        }
    }
}

impl fmt::Display for Hits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (rank, (item, score)) in self.list.iter().enumerate() {
            writeln!(f, "{:>3}. {}\t{:.6}", rank + 1, item, score)?;
        }
        Ok(())
    }
}
