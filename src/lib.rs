/// This crate is a recommendation and retrieval engine for a crowdfunding catalog.
/// It combines learned collaborative-filtering factors, description text similarity and
/// image embedding similarity, and keeps a separate funding-success ranking.
pub mod catalog;
pub mod codec;
pub mod config;
pub mod encoder;
pub mod error;
pub mod index;
pub mod model;
pub mod rank;
pub mod service;
pub mod utils;

/// Recommendation Engine
/// The top-level struct of this crate, the explicit service object a caller builds once
/// at startup and passes into every query.
///
/// Internally, it holds:
/// - The factor scorer (factor table + user/item codecs of one training run)
/// - A swappable catalog snapshot (text model, text and image indexes, funding data)
/// - An optional image model for image probes
///
/// # Operations
/// - `recommend_for_user` (fails with `UnknownUser` on cold start)
/// - `search_by_text`, `search_by_image`, `similar_items`
/// - `rank_by_success_rate`
/// - `fuse` / `fuse_with`
///
/// # Thread Safety
/// All queries take `&self`. The factor model is read-only and the catalog is replaced as
/// a whole, so queries may run concurrently with each other and with `swap_catalog`.
pub use service::RecommendationEngine;

/// Artifact locations for `RecommendationEngine::load`
pub use service::EnginePaths;

/// Offline training entry point
/// Fits the factor model and persists factors + codec under one run id.
pub use service::train;

/// Errors
/// Every fallible operation returns `Result<T, EngineError>`.
pub use error::{EngineError, Result};

/// Configuration
/// `EngineConfig` can be read from a JSON file; every field has a default.
pub use config::{EngineConfig, FusionWeights, OptimizerKind, TrainerConfig};

/// Identifiers and their dense index codec
/// Users and items are encoded by independent codecs and never interchanged.
pub use codec::{IdCodec, ItemId, UserId};

/// Collaborative-filtering trainer and its output
pub use model::trainer::{TrainedModel, Trainer};

/// Read-only factor model inference
pub use model::scorer::FactorScorer;

/// Interaction rows and factor tables
pub use model::{FactorMatrix, FactorTable, InteractionRecord};

/// Persisted artifact layout
pub use model::artifact::{ArtifactPaths, RunId};

/// Catalog snapshot and its builder / swap handle
pub use catalog::{CatalogBuilder, CatalogHandle, CatalogSnapshot};

/// Brute-force cosine index, one per similarity space
pub use index::{CatalogVector, Space, VectorIndex};

/// Encoders
/// `TextEncoder` is fitted once over the catalog descriptions and is part of the snapshot.
/// `ImageEncoder` wraps an external `ImageModel`.
pub use encoder::image::{ImageEncoder, ImageFormat, ImageModel};
pub use encoder::text::TextEncoder;
pub use encoder::Encoder;

/// Corpus for the text model
/// Holds only the number of documents and the per-term document frequency.
///
/// # Thread Safety
/// Implemented using DashMap and atomics, so descriptions can be counted in parallel.
pub use encoder::text::corpus::Corpus;

/// Token Frequency structure
/// Counts of each term within a single document.
pub use encoder::text::token::TermFrequency;

/// TF-IDF engine trait and the default smooth-idf engine
pub use encoder::text::tfidf::{DefaultTfIdfEngine, TfIdfEngine};

/// Ranked lists and their fusion
pub use rank::{Hits, RankedCandidate, Signal};

/// Funding-success ranking
pub use rank::funding::{FundingLedger, FundingRecord};

/// Embedding vector
pub use utils::math::vector::EmbeddingVector;
