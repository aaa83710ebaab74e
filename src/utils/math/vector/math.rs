use num::Num;

use super::EmbeddingVector;

/// ドット積を計算する
///
/// # Arguments
/// * `a` - 左辺
/// * `b` - 右辺 (同じ長さであること)
///
/// # Returns
/// * `f64` - ドット積 (f64 で累積)
#[inline]
pub fn dot<N>(a: &[N], b: &[N]) -> f64
where
    N: Num + Copy + Into<f64>,
{
    debug_assert_eq!(
        a.len(),
        b.len(),
        "Vectors must be of the same length to compute dot product."
    );
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| x.into() * y.into())
        .sum()
}

#[inline]
pub fn norm_sq<N>(a: &[N]) -> f64
where
    N: Num + Copy + Into<f64>,
{
    a.iter().map(|&x| {
        let v: f64 = x.into();
        v * v
    }).sum()
}

#[inline]
pub fn norm<N>(a: &[N]) -> f64
where
    N: Num + Copy + Into<f64>,
{
    norm_sq(a).sqrt()
}

/// Cosine similarity
/// cosθ = A・B / (|A||B|)
///
/// ノルムが 0 のベクトルを含む場合は 0 を返す (ゼロ除算しない)
#[inline]
pub fn cosine_similarity<N>(a: &[N], b: &[N]) -> f64
where
    N: Num + Copy + Into<f64>,
{
    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let sim = dot(a, b) / (norm_a * norm_b);
    // 丸め誤差で [-1, 1] をはみ出さないように
    sim.clamp(-1.0, 1.0)
}

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl EmbeddingVector {
    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        dot(self.as_slice(), other.as_slice())
    }

    #[inline]
    pub fn norm(&self) -> f64 {
        norm(self.as_slice())
    }

    #[inline]
    pub fn cosine_similarity(&self, other: &Self) -> f64 {
        cosine_similarity(self.as_slice(), other.as_slice())
    }

    /// L2 normalize in place
    /// A zero vector stays zero.
    pub fn l2_normalize(&mut self) -> &mut Self {
        let n = self.norm();
        if n > 0.0 {
            let inv = (1.0 / n) as f32;
            self.as_mut_slice().iter_mut().for_each(|v| *v *= inv);
        }
        self
    }

    pub fn l2_normalized(mut self) -> Self {
        self.l2_normalize();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cosine_of_orthogonal_and_parallel_vectors() {
        let a = EmbeddingVector::from(vec![1.0, 0.0]);
        let b = EmbeddingVector::from(vec![0.0, 1.0]);
        let c = EmbeddingVector::from(vec![3.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
        assert!((a.cosine_similarity(&c) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_norm_vector_has_zero_similarity() {
        let a = EmbeddingVector::zeros(3);
        let b = EmbeddingVector::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
        assert_eq!(b.cosine_similarity(&a), 0.0);
        assert_eq!(a.cosine_similarity(&a), 0.0);
    }

    #[test]
    fn l2_normalize_gives_unit_norm() {
        let v = EmbeddingVector::from(vec![3.0, 4.0]).l2_normalized();
        assert!((v.norm() - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
        let z = EmbeddingVector::zeros(2).l2_normalized();
        assert_eq!(z.as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn sigmoid_is_centered() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    proptest! {
        #[test]
        fn cosine_is_symmetric(pairs in prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), 1..32)) {
            let (a, b): (Vec<f32>, Vec<f32>) = pairs.into_iter().unzip();
            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-12);
            prop_assert!((-1.0..=1.0).contains(&ab));
        }

        #[test]
        fn cosine_with_self_is_one(a in prop::collection::vec(-100.0f32..100.0, 1..32)) {
            prop_assume!(norm(&a) > 1e-3);
            prop_assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
        }
    }
}
