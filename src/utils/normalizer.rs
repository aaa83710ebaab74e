/// safe min-max 正規化
/// 各スコアを [0, 1] に写す
///
/// - 非有限値は 0.0 にする (最下位扱い)
/// - 有限値がすべて同値 (要素 1 つを含む) なら全員が最大なので 1.0
/// - 空なら空
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for &v in values {
        if !v.is_finite() { continue; }
        if v < min_v { min_v = v; }
        if v > max_v { max_v = v; }
    }
    if !min_v.is_finite() {
        // 全て非有限
        return vec![0.0; values.len()];
    }
    let range = max_v - min_v;
    // 相対トレランス: 巨大値スケールでも安定
    let tol = (max_v.abs().max(min_v.abs())) * 1e-12 + 1e-15;
    if !range.is_finite() || range <= tol {
        return values
            .iter()
            .map(|v| if v.is_finite() { 1.0 } else { 0.0 })
            .collect();
    }
    // 最大値がちょうど 1.0 になるよう除算で
    values
        .iter()
        .map(|&v| if v.is_finite() { ((v - min_v) / range).clamp(0.0, 1.0) } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_extremes_to_unit_interval() {
        let out = min_max_normalize(&[0.9, 0.1, 0.5]);
        assert_eq!(out[0], 1.0);
        assert_eq!(out[1], 0.0);
        assert!((out[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn constant_and_single_lists_are_all_top() {
        assert_eq!(min_max_normalize(&[0.3]), vec![1.0]);
        assert_eq!(min_max_normalize(&[2.0, 2.0]), vec![1.0, 1.0]);
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn non_finite_values_sink_to_zero() {
        let out = min_max_normalize(&[f64::NAN, 1.0, 3.0]);
        assert_eq!(out, vec![0.0, 0.0, 1.0]);
    }
}
