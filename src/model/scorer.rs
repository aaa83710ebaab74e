use rayon::prelude::*;
use tracing::debug;

use crate::codec::{IdCodec, Index, ItemId, UserId};
use crate::error::{EngineError, Result};
use crate::model::artifact::{ArtifactPaths, RunId};
use crate::model::trainer::TrainedModel;
use crate::model::FactorTable;
use crate::rank::{Hits, Signal};
use crate::utils::sort::sort_by_score_desc;

/// Read-only inference over trained factors
///
/// Holds the factor table and the codec pair of the same training run.
/// Nothing here mutates after construction, so any number of threads can score at once.
#[derive(Debug)]
pub struct FactorScorer {
    run_id: RunId,
    factors: FactorTable,
    users: IdCodec<UserId>,
    items: IdCodec<ItemId>,
}

impl From<TrainedModel> for FactorScorer {
    fn from(model: TrainedModel) -> Self {
        Self {
            run_id: model.run_id,
            factors: model.factors,
            users: model.users,
            items: model.items,
        }
    }
}

impl FactorScorer {
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        TrainedModel::load(paths).map(Self::from)
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn knows_user(&self, user: &UserId) -> bool {
        self.users.contains(user)
    }

    /// Score every item for `user`
    /// Descending by p(u, i); ties by ascending item index.
    /// An unseen user is `UnknownUser` (cold start), never an empty list.
    pub fn score_all(&self, user: &UserId) -> Result<Hits> {
        let u = self
            .users
            .encode(user)
            .map_err(|_| EngineError::UnknownUser(user.to_string()))?;

        let mut scored: Vec<(Index, f64)> = (0..self.items.len())
            .into_par_iter()
            .map(|i| (i, self.factors.affinity(u, i)))
            .collect();
        sort_by_score_desc(&mut scored);
        debug!(user = %user, items = scored.len(), "scored all items");

        let list = scored
            .into_iter()
            .filter_map(|(i, score)| self.items.decode(i).map(|id| (id.clone(), score)))
            .collect();
        Ok(Hits::new(Signal::Collaborative, list))
    }

    /// `score_all` truncated to `k`
    pub fn recommend(&self, user: &UserId, k: usize) -> Result<Hits> {
        let mut hits = self.score_all(user)?;
        hits.truncate(k);
        Ok(hits)
    }
}
