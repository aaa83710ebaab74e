use std::cmp::Ordering;

/// スコア降順、同点はキー昇順で並べる
/// NaN スコアは取り除く
///
/// 同じ入力なら呼び出しごとに同じ順序になる
#[inline]
pub fn sort_by_score_desc<K: Ord>(list: &mut Vec<(K, f64)>) {
    list.retain(|(_, s)| !s.is_nan());
    list.sort_by(|a, b| cmp_score_desc(a, b));
}

/// 上位 k 件だけ残す
/// 全件ソートより select_nth_unstable で先に絞る
pub fn top_k_by_score_desc<K: Ord>(list: &mut Vec<(K, f64)>, k: usize) {
    list.retain(|(_, s)| !s.is_nan());
    if k == 0 {
        list.clear();
        return;
    }
    if list.len() > k {
        list.select_nth_unstable_by(k - 1, |a, b| cmp_score_desc(a, b));
        list.truncate(k);
    }
    list.sort_by(|a, b| cmp_score_desc(a, b));
}

#[inline]
fn cmp_score_desc<K: Ord>(a: &(K, f64), b: &(K, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}
