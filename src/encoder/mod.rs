pub mod image;
pub mod text;

use crate::error::Result;
use crate::utils::math::vector::EmbeddingVector;

/// Uniform `encode -> vector` contract shared by the text and image adapters
pub trait Encoder: Send + Sync {
    type Input: ?Sized;

    fn encode(&self, input: &Self::Input) -> Result<EmbeddingVector>;

    /// output dimension
    fn dim(&self) -> usize;
}
