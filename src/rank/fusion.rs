use indexmap::IndexMap;
use tracing::debug;

use crate::codec::ItemId;
use crate::config::FusionWeights;
use crate::error::Result;
use crate::rank::Hits;
use crate::utils::normalizer::min_max_normalize;
use crate::utils::sort::sort_by_score_desc;

/// Weighted rank fusion
///
/// Each list is min-max normalised on its own, then the normalised scores are combined
/// linearly with the signal's weight. An item missing from a list gets 0 from it.
/// Order is descending combined score, ties by ascending `ItemId`.
///
/// No signals means an empty result, not an error.
pub fn fuse_scored(signals: &[Hits], weights: &FusionWeights) -> Result<Vec<(ItemId, f64)>> {
    weights.validate()?;
    // 挿入順を保つので同じ入力なら同じ集計順
    let mut combined: IndexMap<ItemId, f64> = IndexMap::new();
    for hits in signals {
        let weight = weights.weight(hits.signal);
        let raw: Vec<f64> = hits.list.iter().map(|(_, s)| *s).collect();
        let normalized = min_max_normalize(&raw);
        for ((item, _), norm) in hits.list.iter().zip(normalized) {
            *combined.entry(item.clone()).or_insert(0.0) += weight * norm;
        }
    }
    let mut fused: Vec<(ItemId, f64)> = combined.into_iter().collect();
    sort_by_score_desc(&mut fused);
    debug!(signals = signals.len(), candidates = fused.len(), "fused ranked lists");
    Ok(fused)
}

/// `fuse_scored` without the scores
pub fn fuse(signals: &[Hits], weights: &FusionWeights) -> Result<Vec<ItemId>> {
    Ok(fuse_scored(signals, weights)?
        .into_iter()
        .map(|(id, _)| id)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::rank::Signal;

    fn hits(signal: Signal, list: &[(&str, f64)]) -> Hits {
        Hits::new(signal, list.iter().map(|(id, s)| (ItemId::from(*id), *s)).collect())
    }

    #[test]
    fn mirrored_lists_tie_and_break_by_id() {
        let text = hits(Signal::Text, &[("A", 0.9), ("B", 0.1)]);
        let image = hits(Signal::Image, &[("B", 0.9), ("A", 0.1)]);
        let weights = FusionWeights::default();
        let first = fuse_scored(&[text.clone(), image.clone()], &weights).unwrap();
        assert_eq!(first[0].1, first[1].1);
        assert_eq!(first[0].0, ItemId::from("A"));
        for _ in 0..5 {
            // 入力順を入れ替えても同じ
            assert_eq!(fuse(&[image.clone(), text.clone()], &weights).unwrap(), vec![ItemId::from("A"), ItemId::from("B")]);
        }
    }

    #[test]
    fn empty_signal_set_is_empty_result() {
        assert!(fuse(&[], &FusionWeights::default()).unwrap().is_empty());
    }

    #[test]
    fn weights_shift_the_order() {
        let text = hits(Signal::Text, &[("A", 0.9), ("B", 0.1)]);
        let image = hits(Signal::Image, &[("B", 0.9), ("A", 0.1)]);
        let weights = FusionWeights {
            collaborative: 1.0,
            text: 1.0,
            image: 3.0,
        };
        assert_eq!(fuse(&[text, image], &weights).unwrap()[0], ItemId::from("B"));
    }

    #[test]
    fn scales_are_normalised_before_combining() {
        // collaborative scores are probabilities, text scores are tiny cosines
        let collab = hits(Signal::Collaborative, &[("A", 0.99), ("B", 0.98), ("C", 0.10)]);
        let text = hits(Signal::Text, &[("C", 0.03), ("B", 0.02), ("A", 0.01)]);
        let fused = fuse_scored(&[collab, text], &FusionWeights::default()).unwrap();
        let ids: Vec<&str> = fused.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }

    #[test]
    fn missing_items_contribute_nothing() {
        let text = hits(Signal::Text, &[("A", 0.5)]);
        let image = hits(Signal::Image, &[("B", 0.7), ("C", 0.2)]);
        let fused = fuse_scored(&[text, image], &FusionWeights::default()).unwrap();
        assert_eq!(fused, vec![(ItemId::from("A"), 1.0), (ItemId::from("B"), 1.0), (ItemId::from("C"), 0.0)]);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let weights = FusionWeights {
            collaborative: -1.0,
            ..FusionWeights::default()
        };
        assert!(matches!(fuse(&[], &weights), Err(EngineError::InvalidConfig(_))));
    }
}
