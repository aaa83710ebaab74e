pub mod math;

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// 固定次元の密ベクトル
/// 因子空間、テキスト空間、画像空間のすべてで使う
///
/// 次元は生成時に決まり、以後変わらない
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector {
    values: Box<[f32]>,
}

impl EmbeddingVector {
    #[inline]
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values: values.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn zeros(dim: usize) -> Self {
        Self {
            values: vec![0.0; dim].into_boxed_slice(),
        }
    }

    /// ベクトルの次元
    #[inline]
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.values
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values.into_vec()
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

impl From<&[f32]> for EmbeddingVector {
    fn from(values: &[f32]) -> Self {
        Self::new(values.to_vec())
    }
}

impl Index<usize> for EmbeddingVector {
    type Output = f32;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl fmt::Debug for EmbeddingVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            // 長いベクトルは先頭だけ表示
            let head: Vec<&f32> = self.values.iter().take(8).collect();
            write!(f, "EmbeddingVector(dim: {}, head: {:?})", self.dim(), head)
        } else {
            f.debug_list().entries(self.values.iter()).finish()
        }
    }
}
