use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 小文字化して英数字以外で区切る
/// `char::is_alphanumeric` は Unicode 対応なのでハングルや漢字もそのまま語になる
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

///  TermFrequency 構造体
/// 1 ドキュメント内の語の出現回数を管理する
///
/// # Examples
/// ```
/// use funding_recsys::TermFrequency;
/// let mut freq = TermFrequency::new();
/// freq.add_terms(&["kimchi", "stew", "kimchi"]);
/// assert_eq!(freq.term_count("kimchi"), 2);
/// assert_eq!(freq.term_sum(), 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TermFrequency {
    #[serde(with = "indexmap::map::serde_seq")]
    term_count: IndexMap<String, u32>,
    total_term_count: u64,
}

impl TermFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    /// 文章をトークナイズして作る
    pub fn from_text(text: &str) -> Self {
        let mut freq = Self::new();
        freq.add_terms(&tokenize(text));
        freq
    }

    /// termを追加する
    #[inline]
    pub fn add_term(&mut self, term: &str) -> &mut Self {
        let count = self.term_count.entry(term.to_string()).or_insert(0);
        *count += 1;
        self.total_term_count += 1;
        self
    }

    /// 複数のtermを追加する
    #[inline]
    pub fn add_terms<T>(&mut self, terms: &[T]) -> &mut Self
    where
        T: AsRef<str>,
    {
        for term in terms {
            self.add_term(term.as_ref());
        }
        self
    }

    #[inline]
    pub fn term_count(&self, term: &str) -> u32 {
        self.term_count.get(term).copied().unwrap_or(0)
    }

    /// 総出現数
    #[inline]
    pub fn term_sum(&self) -> u64 {
        self.total_term_count
    }

    /// 異なり語の集合 (初出順)
    #[inline]
    pub fn term_set_ref_str(&self) -> Vec<&str> {
        self.term_count.keys().map(|k| k.as_str()).collect()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.term_count.iter().map(|(k, &v)| (k.as_str(), v))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.term_count.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("Spicy Tteokbokki, 떡볶이 & fried-chicken!"),
            vec!["spicy", "tteokbokki", "떡볶이", "fried", "chicken"]
        );
        assert!(tokenize("  ,,  ").is_empty());
    }

    #[test]
    fn counts_terms() {
        let freq = TermFrequency::from_text("noodle soup noodle");
        assert_eq!(freq.term_count("noodle"), 2);
        assert_eq!(freq.term_count("rice"), 0);
        assert_eq!(freq.term_sum(), 3);
        assert_eq!(freq.term_set_ref_str(), vec!["noodle", "soup"]);
    }
}
