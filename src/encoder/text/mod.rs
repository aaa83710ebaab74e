pub mod corpus;
pub mod tfidf;
pub mod token;

use std::marker::PhantomData;

use indexmap::IndexSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::encoder::Encoder;
use crate::error::{EngineError, Result};
use crate::utils::math::vector::EmbeddingVector;

use self::corpus::Corpus;
use self::tfidf::{DefaultTfIdfEngine, TfIdfEngine};
use self::token::TermFrequency;

/// Vector-space text model fitted once over the catalog descriptions
///
/// The vocabulary fixes the dimensions; it is part of the catalog snapshot and is never
/// refitted per query. Vectors are L2-normalised so cosine similarity compares direction only.
///
/// `TextEncoder<E>` is generic over the weighting engine (`DefaultTfIdfEngine` by default).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TextEncoder<E = DefaultTfIdfEngine> {
    /// term -> dimension
    vocab: IndexSet<Box<str>>,
    /// IDF Vector, same order as `vocab`
    idf: Vec<f32>,
    /// documents seen at fit time
    doc_num: u64,
    #[serde(skip)]
    _marker: PhantomData<E>,
}

impl<E> TextEncoder<E>
where
    E: TfIdfEngine,
{
    /// Fit over the full corpus of descriptions
    /// Fails with `EmptyCorpus` when there is nothing to learn a vocabulary from.
    pub fn fit<S>(descriptions: &[S]) -> Result<Self>
    where
        S: AsRef<str> + Sync,
    {
        let corpus = Corpus::new();
        // コーパスは DashMap なので並列に積める
        descriptions.par_iter().for_each(|doc| {
            let freq = TermFrequency::from_text(doc.as_ref());
            corpus.add_set(&freq.term_set_ref_str());
        });
        if corpus.vocab_size() == 0 {
            return Err(EngineError::EmptyCorpus);
        }
        let vocab: IndexSet<Box<str>> = corpus.sorted_terms().into_iter().collect();
        let idf = E::idf_vec(&corpus, &vocab);
        info!(documents = corpus.get_doc_num(), vocab = vocab.len(), "fitted text model");
        Ok(Self {
            vocab,
            idf,
            doc_num: corpus.get_doc_num(),
            _marker: PhantomData,
        })
    }

    /// Vector for a query string in the fitted space
    /// Terms outside the vocabulary are dropped, so an all-unknown query is a zero vector.
    pub fn transform(&self, text: &str) -> EmbeddingVector {
        let freq = TermFrequency::from_text(text);
        EmbeddingVector::new(E::tf_idf_vec(&freq, &self.vocab, &self.idf)).l2_normalized()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn doc_num(&self) -> u64 {
        self.doc_num
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocab.contains(term)
    }
}

impl<E> Encoder for TextEncoder<E>
where
    E: TfIdfEngine + Send + Sync,
{
    type Input = str;

    fn encode(&self, input: &str) -> Result<EmbeddingVector> {
        Ok(self.transform(input))
    }

    fn dim(&self) -> usize {
        self.vocab.len()
    }
}
