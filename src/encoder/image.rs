use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::codec::ItemId;
use crate::encoder::Encoder;
use crate::error::{EngineError, Result};
use crate::utils::math::vector::EmbeddingVector;

/// Container formats accepted as image probes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Bmp,
}

impl ImageFormat {
    /// magic bytes から判定する
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::WebP),
            [b'B', b'M', ..] => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// Pretrained image-embedding model (a CLIP-style vision tower, an ONNX session, ...)
///
/// The engine does not ship weights. Callers plug their model in here; it only has to map
/// image bytes of a known format to a vector of `dim()` floats.
pub trait ImageModel: Send + Sync {
    fn embed(&self, image: &[u8], format: ImageFormat) -> Result<EmbeddingVector>;

    fn dim(&self) -> usize;

    fn name(&self) -> &str {
        "image-model"
    }
}

/// Image adapter
/// Rejects bytes that are not a recognisable image before they reach the model,
/// and surfaces any model failure as `InvalidImage`.
#[derive(Clone)]
pub struct ImageEncoder {
    model: Arc<dyn ImageModel>,
}

impl fmt::Debug for ImageEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageEncoder")
            .field("model", &self.model.name())
            .field("dim", &self.model.dim())
            .finish()
    }
}

impl ImageEncoder {
    pub fn new(model: Arc<dyn ImageModel>) -> Self {
        Self { model }
    }
}

impl Encoder for ImageEncoder {
    type Input = [u8];

    fn encode(&self, input: &[u8]) -> Result<EmbeddingVector> {
        if input.is_empty() {
            return Err(EngineError::InvalidImage("empty input".into()));
        }
        let format = ImageFormat::sniff(input)
            .ok_or_else(|| EngineError::InvalidImage("unrecognised image format".into()))?;
        debug!(?format, bytes = input.len(), model = self.model.name(), "embedding image probe");
        let vector = self.model.embed(input, format).map_err(|err| match err {
            EngineError::InvalidImage(msg) => EngineError::InvalidImage(msg),
            other => EngineError::InvalidImage(format!("{} failed: {}", self.model.name(), other)),
        })?;
        if vector.dim() != self.model.dim() {
            error!(expected = self.model.dim(), actual = vector.dim(), "image model returned wrong dimension");
            return Err(EngineError::DimensionMismatch {
                expected: self.model.dim(),
                actual: vector.dim(),
            });
        }
        Ok(vector)
    }

    fn dim(&self) -> usize {
        self.model.dim()
    }
}

#[derive(Debug, Deserialize)]
struct ImageEmbeddingRow {
    image_url: String,
    embedding: Vec<f32>,
}

/// Parse precomputed image vectors as written by the offline embedding job
///
/// ```json
/// [{ "image_url": "12.jpg", "embedding": [0.1, -0.3, ...] }]
/// ```
/// The file stem (`12`) is the item id.
pub fn parse_image_embeddings(json: &str) -> Result<Vec<(ItemId, EmbeddingVector)>> {
    let rows: Vec<ImageEmbeddingRow> = serde_json::from_str(json)?;
    rows.into_iter()
        .map(|row| {
            let stem = Path::new(&row.image_url)
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .ok_or_else(|| EngineError::UnknownIdentifier(row.image_url.clone()))?;
            Ok((ItemId::from(stem), EmbeddingVector::new(row.embedding)))
        })
        .collect()
}

pub fn read_image_embeddings(path: impl AsRef<Path>) -> Result<Vec<(ItemId, EmbeddingVector)>> {
    let raw = std::fs::read_to_string(path.as_ref())?;
    let vectors = parse_image_embeddings(&raw)?;
    info!(path = ?path.as_ref(), vectors = vectors.len(), "read image embeddings");
    Ok(vectors)
}
