use thiserror::Error;

/// Errors returned by every engine operation
#[derive(Error, Debug)]
pub enum EngineError {
    /// user was not present when the model was trained (cold start)
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// identifier was never seen while the codec or catalog was built
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// training was asked to fit a model with no interaction rows
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// probe bytes could not be decoded into an image embedding
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// vector compared against or inserted into a space of another dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// text search before any description vectors exist
    #[error("empty corpus: no description vectors are available")]
    EmptyCorpus,

    /// factors and codec come from different training runs
    #[error("artifact mismatch: factors from run {factors}, codec from run {codec}")]
    ArtifactMismatch { factors: String, codec: String },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_cbor::Error> for EngineError {
    fn from(err: serde_cbor::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
