use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::codec::ItemId;
use crate::error::{EngineError, Result};
use crate::rank::{Hits, Signal};
use crate::utils::math::vector::EmbeddingVector;
use crate::utils::sort::top_k_by_score_desc;

/// Similarity space a vector belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Space {
    Text,
    Image,
}

impl Space {
    pub fn signal(self) -> Signal {
        match self {
            Space::Text => Signal::Text,
            Space::Image => Signal::Image,
        }
    }
}

/// Precomputed vector for one item in one space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogVector {
    pub item: ItemId,
    pub vector: EmbeddingVector,
    pub space: Space,
}

/// Brute-force cosine index over every catalog vector of one space
///
/// Insert/replace is an `IndexMap` insert; a query scores every stored vector (O(N*d)).
/// The dimension is fixed by the constructor or, failing that, by the first insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    space: Space,
    dim: Option<usize>,
    entries: IndexMap<ItemId, EmbeddingVector>,
}

impl VectorIndex {
    pub fn new(space: Space) -> Self {
        Self {
            space,
            dim: None,
            entries: IndexMap::new(),
        }
    }

    pub fn with_dim(space: Space, dim: usize) -> Self {
        Self {
            space,
            dim: Some(dim),
            entries: IndexMap::new(),
        }
    }

    #[inline]
    pub fn space(&self) -> Space {
        self.space
    }

    #[inline]
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, item: &ItemId) -> bool {
        self.entries.contains_key(item)
    }

    pub fn get(&self, item: &ItemId) -> Option<&EmbeddingVector> {
        self.entries.get(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, &EmbeddingVector)> {
        self.entries.iter()
    }

    /// insert or replace, returns the previous vector
    pub fn insert(&mut self, item: ItemId, vector: EmbeddingVector) -> Result<Option<EmbeddingVector>> {
        self.check_dim(vector.dim())?;
        self.dim.get_or_insert(vector.dim());
        Ok(self.entries.insert(item, vector))
    }

    pub fn insert_catalog_vector(&mut self, cv: CatalogVector) -> Result<Option<EmbeddingVector>> {
        if cv.space != self.space {
            return Err(EngineError::InvalidConfig(format!(
                "{:?} vector for item {} offered to the {:?} index",
                cv.space, cv.item, self.space
            )));
        }
        self.insert(cv.item, cv.vector)
    }

    /// Top-k items by cosine similarity to `probe`
    /// Sorted descending, ties by ascending `ItemId`, length `min(k, len)`.
    pub fn top_k(&self, probe: &EmbeddingVector, k: usize) -> Result<Hits> {
        self.check_dim(probe.dim())?;
        let mut scored: Vec<(ItemId, f64)> = self
            .entries
            .par_iter()
            .map(|(item, vector)| (item.clone(), probe.cosine_similarity(vector)))
            .collect();
        top_k_by_score_desc(&mut scored, k);
        debug!(space = ?self.space, candidates = self.entries.len(), k, returned = scored.len(), "top-k query");
        Ok(Hits::new(self.space.signal(), scored))
    }

    /// Nearest neighbours of a stored item, the item itself excluded
    pub fn neighbours_of(&self, item: &ItemId, k: usize) -> Result<Hits> {
        let probe = self
            .entries
            .get(item)
            .ok_or_else(|| EngineError::UnknownIdentifier(item.to_string()))?;
        let mut hits = self.top_k(probe, k.saturating_add(1))?;
        hits.list.retain(|(id, _)| id != item);
        hits.truncate(k);
        Ok(hits)
    }

    #[inline]
    fn check_dim(&self, actual: usize) -> Result<()> {
        match self.dim {
            Some(expected) if expected != actual => {
                error!(space = ?self.space, expected, actual, "vector dimension mismatch");
                Err(EngineError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_items() -> VectorIndex {
        let mut index = VectorIndex::new(Space::Text);
        index.insert(ItemId::from("1"), vec![1.0, 0.0].into()).unwrap();
        index.insert(ItemId::from("2"), vec![0.0, 1.0].into()).unwrap();
        index.insert(ItemId::from("3"), vec![0.7, 0.7].into()).unwrap();
        index
    }

    #[test]
    fn top_two_for_x_axis_probe() {
        let index = three_items();
        let hits = index.top_k(&vec![1.0, 0.0].into(), 2).unwrap();
        assert_eq!(hits.signal, Signal::Text);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits.list[0].0, ItemId::from("1"));
        assert!((hits.list[0].1 - 1.0).abs() < 1e-9);
        assert_eq!(hits.list[1].0, ItemId::from("3"));
        assert!((hits.list[1].1 - 0.7071).abs() < 1e-3);
        assert!(hits.item_ids().all(|id| id.as_str() != "2"));
    }

    #[test]
    fn length_is_min_of_k_and_size() {
        let index = three_items();
        let probe: EmbeddingVector = vec![0.3, 0.9].into();
        for k in 0..6 {
            let hits = index.top_k(&probe, k).unwrap();
            assert_eq!(hits.len(), k.min(3));
            assert!(hits.list.windows(2).all(|w| w[0].1 >= w[1].1));
            assert!(hits.item_ids().all(|id| index.contains(id)));
        }
    }

    #[test]
    fn ties_break_by_item_id() {
        let mut index = VectorIndex::new(Space::Image);
        index.insert(ItemId::from("b"), vec![1.0, 1.0].into()).unwrap();
        index.insert(ItemId::from("a"), vec![2.0, 2.0].into()).unwrap();
        let hits = index.top_k(&vec![1.0, 1.0].into(), 2).unwrap();
        assert_eq!(hits.list[0].0, ItemId::from("a"));
        assert_eq!(hits.list[1].0, ItemId::from("b"));
    }

    #[test]
    fn dimension_mismatch_is_refused() {
        let mut index = three_items();
        let err = index.top_k(&vec![1.0, 0.0, 0.0].into(), 1).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { expected: 2, actual: 3 }));
        let err = index.insert(ItemId::from("4"), vec![1.0].into()).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { .. }));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn replace_keeps_one_vector_per_item() {
        let mut index = three_items();
        let old = index.insert(ItemId::from("2"), vec![1.0, 0.0].into()).unwrap();
        assert_eq!(old, Some(EmbeddingVector::from(vec![0.0, 1.0])));
        assert_eq!(index.len(), 3);
        let hits = index.top_k(&vec![1.0, 0.0].into(), 2).unwrap();
        let ids: Vec<&str> = hits.item_ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn neighbours_exclude_self() {
        let index = three_items();
        let hits = index.neighbours_of(&ItemId::from("3"), 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.item_ids().all(|id| id.as_str() != "3"));
        assert!(index.neighbours_of(&ItemId::from("9"), 1).is_err());
    }

    #[test]
    fn wrong_space_is_rejected() {
        let mut index = VectorIndex::new(Space::Image);
        let cv = CatalogVector {
            item: ItemId::from("1"),
            vector: vec![1.0].into(),
            space: Space::Text,
        };
        assert!(index.insert_catalog_vector(cv).is_err());
    }
}
