use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{CatalogHandle, CatalogSnapshot};
use crate::codec::{ItemId, UserId};
use crate::config::{EngineConfig, FusionWeights, TrainerConfig};
use crate::encoder::image::{ImageEncoder, ImageModel};
use crate::encoder::Encoder;
use crate::error::{EngineError, Result};
use crate::index::Space;
use crate::model::artifact::{ArtifactPaths, RunId};
use crate::model::scorer::FactorScorer;
use crate::model::trainer::{TrainedModel, Trainer};
use crate::model::InteractionRecord;
use crate::rank::fusion;
use crate::rank::{Hits, Signal};

/// Locations of everything a serving process loads at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePaths {
    pub artifacts: ArtifactPaths,
    pub catalog: PathBuf,
}

impl EnginePaths {
    /// `factors.cbor`, `codec.cbor` and `catalog.cbor` side by side in `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            artifacts: ArtifactPaths::in_dir(dir),
            catalog: dir.join(CatalogSnapshot::FILE),
        }
    }
}

/// Offline entry point: fit factors and codecs, then persist them as one versioned pair
pub fn train(
    interactions: &[InteractionRecord],
    config: &TrainerConfig,
    paths: &ArtifactPaths,
) -> Result<TrainedModel> {
    let model = Trainer::new(config.clone())?.fit(interactions)?;
    model.save(paths)?;
    Ok(model)
}

impl CatalogSnapshot {
    /// Text relevance over the description vectors
    /// `EmptyCorpus` when no description vectors exist yet.
    /// A query sharing no term with the fitted vocabulary matches nothing and gives an
    /// empty list.
    pub fn search_text(&self, query: &str, k: usize) -> Result<Hits> {
        let encoder = self.text_encoder.as_ref().ok_or(EngineError::EmptyCorpus)?;
        if self.text_index.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }
        let query_vector = encoder.encode(query)?;
        if query_vector.norm() == 0.0 {
            debug!(query, "no query term in the text vocabulary");
            return Ok(Hits::new(Signal::Text, Vec::new()));
        }
        self.text_index.top_k(&query_vector, k)
    }
}

/// Serving-side engine
///
/// Built once at startup by `load` and handed to whoever answers queries. The factor
/// model never changes after construction; the catalog can be replaced as a whole with
/// `swap_catalog`. All query methods take `&self` and may run concurrently.
pub struct RecommendationEngine {
    config: EngineConfig,
    scorer: FactorScorer,
    catalog: CatalogHandle,
    image: Option<ImageEncoder>,
}

impl std::fmt::Debug for RecommendationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommendationEngine")
            .field("run_id", self.scorer.run_id())
            .field("items", &self.scorer.item_count())
            .field("image", &self.image)
            .finish()
    }
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig, scorer: FactorScorer, catalog: CatalogSnapshot) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer,
            catalog: CatalogHandle::new(catalog),
            image: None,
        })
    }

    /// Plug in the model used to embed image probes
    pub fn with_image_model(mut self, model: Arc<dyn ImageModel>) -> Self {
        self.image = Some(ImageEncoder::new(model));
        self
    }

    /// Load model artifacts and the catalog snapshot
    pub fn load(paths: &EnginePaths, config: EngineConfig) -> Result<Self> {
        let scorer = FactorScorer::load(&paths.artifacts)?;
        let catalog = CatalogSnapshot::load(&paths.catalog)?;
        let engine = Self::new(config, scorer, catalog)?;
        info!(run_id = %engine.run_id(), "recommendation engine ready");
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run_id(&self) -> &RunId {
        self.scorer.run_id()
    }

    /// current catalog snapshot
    pub fn catalog(&self) -> Arc<CatalogSnapshot> {
        self.catalog.snapshot()
    }

    pub fn swap_catalog(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        self.catalog.swap(snapshot)
    }

    /// Top `k` items by learned affinity
    /// Cold-start users fail with `UnknownUser`.
    pub fn recommend_for_user(&self, user: &UserId, k: usize) -> Result<Hits> {
        self.scorer.recommend(user, k)
    }

    pub fn search_by_text(&self, query: &str, k: usize) -> Result<Hits> {
        self.catalog.snapshot().search_text(query, k)
    }

    /// Visual similarity for a raw image probe
    /// Undecodable bytes fail with `InvalidImage`.
    pub fn search_by_image(&self, image: &[u8], k: usize) -> Result<Hits> {
        let encoder = self
            .image
            .as_ref()
            .ok_or_else(|| EngineError::InvalidConfig("no image model configured".into()))?;
        let probe = encoder.encode(image)?;
        self.catalog.snapshot().image_index.top_k(&probe, k)
    }

    /// Items closest to `item` in one space, `item` itself excluded
    pub fn similar_items(&self, item: &ItemId, space: Space, k: usize) -> Result<Hits> {
        let snapshot = self.catalog.snapshot();
        match space {
            Space::Text => snapshot.text_index.neighbours_of(item, k),
            Space::Image => snapshot.image_index.neighbours_of(item, k),
        }
    }

    pub fn rank_by_success_rate(&self, items: &[ItemId]) -> Result<Vec<(ItemId, f64)>> {
        let ranked = self.catalog.snapshot().funding.rank_by_success_rate(items)?;
        debug!(candidates = items.len(), ranked = ranked.len(), "ranked by funding success");
        Ok(ranked)
    }

    /// `fuse_with` under the configured weights
    pub fn fuse(&self, signals: &[Hits]) -> Result<Vec<ItemId>> {
        self.fuse_with(signals, &self.config.fusion)
    }

    pub fn fuse_with(&self, signals: &[Hits], weights: &FusionWeights) -> Result<Vec<ItemId>> {
        fusion::fuse(signals, weights)
    }
}
