pub mod artifact;
pub mod negative;
pub mod optim;
pub mod scorer;
pub mod trainer;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::codec::{Index, ItemId, UserId};
use crate::error::{EngineError, Result};
use crate::utils::math::vector::math::{dot, sigmoid};

/// One observed positive signal (a user funded an item)
/// The label is implicitly 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user: UserId,
    pub item: ItemId,
}

impl InteractionRecord {
    pub fn new(user: impl Into<UserId>, item: impl Into<ItemId>) -> Self {
        Self {
            user: user.into(),
            item: item.into(),
        }
    }
}

/// Dense row-major `N x k` factor matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl FactorMatrix {
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self {
            rows,
            dim,
            data: vec![0.0; rows * dim],
        }
    }

    /// uniform in `[-scale, scale]`
    pub fn random<R: Rng>(rows: usize, dim: usize, scale: f64, rng: &mut R) -> Self {
        let scale = scale as f32;
        let data = (0..rows * dim).map(|_| rng.gen_range(-scale..=scale)).collect();
        Self { rows, dim, data }
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in &rows {
            if row.len() != dim {
                return Err(EngineError::DimensionMismatch {
                    expected: dim,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            dim,
            data,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn row(&self, index: Index) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    #[inline]
    pub fn row_mut(&mut self, index: Index) -> &mut [f32] {
        &mut self.data[index * self.dim..(index + 1) * self.dim]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// 保存データの整合性チェック
    pub(crate) fn check_shape(&self) -> Result<()> {
        if self.data.len() != self.rows * self.dim {
            return Err(EngineError::Serialization(format!(
                "factor matrix holds {} values, expected {} x {}",
                self.data.len(),
                self.rows,
                self.dim
            )));
        }
        Ok(())
    }
}

/// Learned latent factors for users and items
/// Immutable once training completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorTable {
    pub users: FactorMatrix,
    pub items: FactorMatrix,
}

impl FactorTable {
    pub fn new(users: FactorMatrix, items: FactorMatrix) -> Result<Self> {
        if users.dim() != items.dim() {
            return Err(EngineError::DimensionMismatch {
                expected: users.dim(),
                actual: items.dim(),
            });
        }
        Ok(Self { users, items })
    }

    /// factor dimension `k`
    #[inline]
    pub fn dim(&self) -> usize {
        self.users.dim()
    }

    #[inline]
    pub fn logit(&self, user: Index, item: Index) -> f64 {
        dot(self.users.row(user), self.items.row(item))
    }

    /// p(u, i) = sigmoid(dot(UserFactors[u], ItemFactors[i]))
    #[inline]
    pub fn affinity(&self, user: Index, item: Index) -> f64 {
        sigmoid(self.logit(user, item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affinity_is_sigmoid_of_dot() {
        let users = FactorMatrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        let items = FactorMatrix::from_rows(vec![vec![0.5, -0.25], vec![0.0, 0.0]]).unwrap();
        let table = FactorTable::new(users, items).unwrap();
        assert_eq!(table.logit(0, 0), 0.0);
        assert_eq!(table.affinity(0, 0), 0.5);
        assert_eq!(table.affinity(0, 1), 0.5);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = FactorMatrix::from_rows(vec![vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, EngineError::DimensionMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn mismatched_table_dims_are_rejected() {
        let users = FactorMatrix::zeros(2, 3);
        let items = FactorMatrix::zeros(2, 4);
        assert!(FactorTable::new(users, items).is_err());
    }
}
