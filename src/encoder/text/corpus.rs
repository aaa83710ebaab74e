use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use dashmap::DashMap;

/// keep document count and per-term document frequency in a thread-safe way
/// Descriptions can be folded in from many rayon workers at once.
#[derive(Debug, Default)]
pub struct Corpus {
    /// number of documents added
    pub doc_num: AtomicU64,
    /// term -> number of documents containing it
    pub term_counts: DashMap<Box<str>, u64, RandomState>,
}

impl Corpus {
    /// Create a new instance
    pub fn new() -> Self {
        Self {
            doc_num: AtomicU64::new(0),
            term_counts: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Add one document's distinct terms to the corpus
    pub fn add_set<T>(&self, terms: &[T])
    where
        T: AsRef<str>,
    {
        self.doc_num.fetch_add(1, Ordering::Relaxed);
        for term in terms {
            self.term_counts
                .entry(term.as_ref().into())
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    /// Get the number of documents in the corpus
    pub fn get_doc_num(&self) -> u64 {
        self.doc_num.load(Ordering::Relaxed)
    }

    /// Get the document frequency of a term
    pub fn get_term_count(&self, term: &str) -> u64 {
        self.term_counts.get(term).map_or(0, |count| *count)
    }

    /// Get the current vocabulary size (number of unique terms)
    #[inline]
    pub fn vocab_size(&self) -> usize {
        self.term_counts.len()
    }

    /// 全語彙を辞書順で返す
    /// DashMap の反復順は不定なので、次元の並びはここで固定する
    pub fn sorted_terms(&self) -> Vec<Box<str>> {
        let mut terms: Vec<Box<str>> = self
            .term_counts
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        terms.sort_unstable();
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn counts_documents_not_occurrences() {
        let corpus = Corpus::new();
        corpus.add_set(&["rust", "fast"]);
        corpus.add_set(&["rust", "safe"]);
        assert_eq!(corpus.get_doc_num(), 2);
        assert_eq!(corpus.get_term_count("rust"), 2);
        assert_eq!(corpus.get_term_count("safe"), 1);
        assert_eq!(corpus.get_term_count("slow"), 0);
        assert_eq!(corpus.vocab_size(), 3);
    }

    #[test]
    fn parallel_adds_are_consistent() {
        let corpus = Corpus::new();
        (0..200).into_par_iter().for_each(|i| {
            let own = format!("t{}", i % 10);
            corpus.add_set(&["shared".to_string(), own]);
        });
        assert_eq!(corpus.get_doc_num(), 200);
        assert_eq!(corpus.get_term_count("shared"), 200);
        assert_eq!(corpus.get_term_count("t3"), 20);
        let terms = corpus.sorted_terms();
        assert_eq!(terms.first().map(|t| &**t), Some("shared"));
    }
}
