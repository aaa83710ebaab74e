use indexmap::IndexSet;

use crate::encoder::text::corpus::Corpus;
use crate::encoder::text::token::TermFrequency;

/// TF-IDF 計算エンジン
/// `TextEncoder<E>` に差し込む重み付け戦略
pub trait TfIdfEngine {
    /// IDFベクトルを生成する
    /// # Arguments
    /// * `corpus` - コーパス
    /// * `vocab` - 語彙 (次元の並び)
    fn idf_vec(corpus: &Corpus, vocab: &IndexSet<Box<str>>) -> Vec<f32>;

    /// 重み付き (正規化前) ベクトルを生成する
    /// 語彙にない語は無視する
    fn tf_idf_vec(freq: &TermFrequency, vocab: &IndexSet<Box<str>>, idf: &[f32]) -> Vec<f32>;
}

/// デフォルトのTF-IDFエンジン
/// - tf: 生の出現回数
/// - idf: ln((1 + n) / (1 + df)) + 1 (smooth idf, 全文書に出る語も 0 にならない)
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTfIdfEngine;

impl TfIdfEngine for DefaultTfIdfEngine {
    fn idf_vec(corpus: &Corpus, vocab: &IndexSet<Box<str>>) -> Vec<f32> {
        let doc_num = corpus.get_doc_num() as f64;
        vocab
            .iter()
            .map(|term| {
                let doc_freq = corpus.get_term_count(term) as f64;
                (((1.0 + doc_num) / (1.0 + doc_freq)).ln() + 1.0) as f32
            })
            .collect()
    }

    fn tf_idf_vec(freq: &TermFrequency, vocab: &IndexSet<Box<str>>, idf: &[f32]) -> Vec<f32> {
        let mut vec = vec![0.0f32; vocab.len()];
        for (term, count) in freq.iter() {
            if let Some(idx) = vocab.get_index_of(term) {
                vec[idx] = count as f32 * idf[idx];
            }
        }
        vec
    }
}
