use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::codec::ItemId;
use crate::encoder::text::tfidf::DefaultTfIdfEngine;
use crate::encoder::text::TextEncoder;
use crate::error::{EngineError, Result};
use crate::index::{Space, VectorIndex};
use crate::model::artifact::{read_cbor, write_cbor};
use crate::rank::funding::{FundingLedger, FundingRecord};
use crate::utils::math::vector::EmbeddingVector;

/// Everything a query reads besides the factor model
///
/// The fitted text vocabulary is part of the snapshot: query vectors are only comparable
/// with description vectors produced by the same fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub text_encoder: Option<TextEncoder>,
    pub text_index: VectorIndex,
    pub image_index: VectorIndex,
    pub funding: FundingLedger,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self {
            text_encoder: None,
            text_index: VectorIndex::new(Space::Text),
            image_index: VectorIndex::new(Space::Image),
            funding: FundingLedger::new(),
        }
    }
}

impl CatalogSnapshot {
    pub const FILE: &'static str = "catalog.cbor";

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_cbor(path.as_ref(), self)?;
        info!(
            path = ?path.as_ref(),
            text = self.text_index.len(),
            image = self.image_index.len(),
            funding = self.funding.len(),
            "saved catalog snapshot"
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let snapshot: Self = read_cbor(path.as_ref())?;
        if snapshot.text_index.space() != Space::Text || snapshot.image_index.space() != Space::Image {
            return Err(EngineError::Serialization(
                "catalog snapshot has its indexes swapped".into(),
            ));
        }
        if let (Some(encoder), Some(dim)) = (&snapshot.text_encoder, snapshot.text_index.dim()) {
            if encoder.vocab_size() != dim {
                return Err(EngineError::Serialization(format!(
                    "catalog text model has {} terms but its text index holds {}-dimensional vectors",
                    encoder.vocab_size(),
                    dim
                )));
            }
        }
        info!(
            path = ?path.as_ref(),
            text = snapshot.text_index.len(),
            image = snapshot.image_index.len(),
            funding = snapshot.funding.len(),
            "loaded catalog snapshot"
        );
        Ok(snapshot)
    }
}

/// Collects raw catalog rows and turns them into a `CatalogSnapshot`
#[derive(Debug, Default, Clone)]
pub struct CatalogBuilder {
    descriptions: Vec<(ItemId, String)>,
    images: Vec<(ItemId, EmbeddingVector)>,
    funding: Vec<FundingRecord>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(&mut self, item: impl Into<ItemId>, text: impl Into<String>) -> &mut Self {
        self.descriptions.push((item.into(), text.into()));
        self
    }

    pub fn descriptions<I, K, T>(&mut self, rows: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<ItemId>,
        T: Into<String>,
    {
        for (item, text) in rows {
            self.description(item, text);
        }
        self
    }

    pub fn image_vector(&mut self, item: impl Into<ItemId>, vector: impl Into<EmbeddingVector>) -> &mut Self {
        self.images.push((item.into(), vector.into()));
        self
    }

    pub fn image_vectors<I>(&mut self, rows: I) -> &mut Self
    where
        I: IntoIterator<Item = (ItemId, EmbeddingVector)>,
    {
        self.images.extend(rows);
        self
    }

    pub fn funding<I>(&mut self, records: I) -> &mut Self
    where
        I: IntoIterator<Item = FundingRecord>,
    {
        self.funding.extend(records);
        self
    }

    /// Fit the text model over the descriptions, encode them, and index the image vectors
    ///
    /// A later row for the same item replaces an earlier one, before fitting: the replaced
    /// text counts neither as a document nor towards the vocabulary.
    /// Descriptions without a single term leave the snapshot without a text model;
    /// image vectors of inconsistent dimension fail with `DimensionMismatch`.
    pub fn build(&self) -> Result<CatalogSnapshot> {
        let mut snapshot = CatalogSnapshot::default();

        if !self.descriptions.is_empty() {
            // 最後の行が勝つ、位置は初出のまま
            let mut latest: IndexMap<&ItemId, &str> = IndexMap::with_capacity(self.descriptions.len());
            for (item, text) in &self.descriptions {
                latest.insert(item, text.as_str());
            }
            let texts: Vec<&str> = latest.values().copied().collect();
            match TextEncoder::<DefaultTfIdfEngine>::fit(&texts) {
                Ok(encoder) => {
                    let vectors: Vec<EmbeddingVector> =
                        texts.par_iter().map(|text| encoder.transform(text)).collect();
                    for (item, vector) in latest.keys().zip(vectors) {
                        snapshot.text_index.insert((*item).clone(), vector)?;
                    }
                    snapshot.text_encoder = Some(encoder);
                }
                Err(EngineError::EmptyCorpus) => {
                    warn!(descriptions = texts.len(), "descriptions contain no terms, text search disabled");
                }
                Err(err) => return Err(err),
            }
        }

        for (item, vector) in &self.images {
            snapshot.image_index.insert(item.clone(), vector.clone())?;
        }
        snapshot.funding = FundingLedger::from_records(self.funding.iter().cloned());

        info!(
            text = snapshot.text_index.len(),
            vocab = snapshot.text_encoder.as_ref().map_or(0, |e| e.vocab_size()),
            image = snapshot.image_index.len(),
            funding = snapshot.funding.len(),
            "built catalog snapshot"
        );
        Ok(snapshot)
    }
}

/// Shared, swappable catalog
///
/// Readers take an `Arc` to the current snapshot and keep using it for the whole query.
/// `swap` replaces the snapshot as a whole; a reader never sees a half-updated index.
#[derive(Debug, Default)]
pub struct CatalogHandle {
    current: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogHandle {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().clone()
    }

    /// returns the snapshot that was replaced
    pub fn swap(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        info!(
            text = snapshot.text_index.len(),
            image = snapshot.image_index.len(),
            funding = snapshot.funding.len(),
            "swapping catalog snapshot"
        );
        std::mem::replace(&mut *self.current.write(), Arc::new(snapshot))
    }
}
