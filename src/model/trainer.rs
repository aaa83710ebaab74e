use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info, warn};

use crate::codec::{IdCodec, Index, ItemId, UserId};
use crate::config::TrainerConfig;
use crate::error::{EngineError, Result};
use crate::model::artifact::RunId;
use crate::model::negative::{NegativeSampler, Sample};
use crate::model::{optim, FactorMatrix, FactorTable, InteractionRecord};
use crate::utils::math::vector::math::{dot, sigmoid};

/// log(0) を避けるためのクリップ幅
const PROB_EPS: f64 = 1e-7;

/// Output of one training run
/// Factors and codecs always travel together under the same `run_id`.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub run_id: RunId,
    pub factors: FactorTable,
    pub users: IdCodec<UserId>,
    pub items: IdCodec<ItemId>,
    /// mean binary cross-entropy per epoch, measured before that epoch's update
    pub loss_history: Vec<f64>,
}

/// Collaborative-filtering trainer
///
/// Fits user/item factors so that `sigmoid(dot(user, item))` predicts the implicit label.
/// Every epoch is one full-batch forward pass, a scalar loss, and one update of both tables.
/// Offline and single threaded.
#[derive(Debug, Clone)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn fit(&self, interactions: &[InteractionRecord]) -> Result<TrainedModel> {
        if interactions.is_empty() {
            return Err(EngineError::InsufficientData(
                "cannot fit a factor model with zero interaction records".into(),
            ));
        }
        let cfg = &self.config;

        // id -> index
        let mut users = IdCodec::new();
        let mut items = IdCodec::new();
        let pairs: Vec<(Index, Index)> = interactions
            .iter()
            .map(|r| (users.insert(r.user.clone()), items.insert(r.item.clone())))
            .collect();
        info!(
            records = pairs.len(),
            users = users.len(),
            items = items.len(),
            factors = cfg.factors,
            "training collaborative-filtering model"
        );

        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let sampler = NegativeSampler::new(&pairs, users.len(), items.len(), cfg.negatives_per_positive);
        let (samples, shortfall) = sampler.samples(&pairs, &mut rng);
        if shortfall > 0 {
            warn!(shortfall, "some negatives could not be drawn (users saturated the catalog)");
        }
        debug!(samples = samples.len(), "training samples ready");

        let mut user_factors = FactorMatrix::random(users.len(), cfg.factors, cfg.init_scale, &mut rng);
        let mut item_factors = FactorMatrix::random(items.len(), cfg.factors, cfg.init_scale, &mut rng);
        let mut user_opt = optim::build(cfg.optimizer, cfg.learning_rate, user_factors.as_slice().len());
        let mut item_opt = optim::build(cfg.optimizer, cfg.learning_rate, item_factors.as_slice().len());
        let mut user_grad = FactorMatrix::zeros(users.len(), cfg.factors);
        let mut item_grad = FactorMatrix::zeros(items.len(), cfg.factors);

        let mut loss_history = Vec::with_capacity(cfg.epochs);
        for epoch in 0..cfg.epochs {
            let loss = accumulate_gradients(
                &samples,
                &user_factors,
                &item_factors,
                &mut user_grad,
                &mut item_grad,
            );
            if cfg.l2 > 0.0 {
                add_l2(&mut user_grad, &user_factors, cfg.l2);
                add_l2(&mut item_grad, &item_factors, cfg.l2);
            }
            user_opt.step(user_factors.as_mut_slice(), user_grad.as_slice());
            item_opt.step(item_factors.as_mut_slice(), item_grad.as_slice());

            info!(epoch = epoch + 1, loss, "epoch finished");
            loss_history.push(loss);
        }

        Ok(TrainedModel {
            run_id: RunId::generate(),
            factors: FactorTable::new(user_factors, item_factors)?,
            users,
            items,
            loss_history,
        })
    }
}

/// forward + backward over all samples
/// 勾配バッファは上書きされる。戻り値は平均 BCE
fn accumulate_gradients(
    samples: &[Sample],
    user_factors: &FactorMatrix,
    item_factors: &FactorMatrix,
    user_grad: &mut FactorMatrix,
    item_grad: &mut FactorMatrix,
) -> f64 {
    user_grad.as_mut_slice().fill(0.0);
    item_grad.as_mut_slice().fill(0.0);
    let n = samples.len() as f64;
    let mut loss = 0.0;
    for &(u, i, label) in samples {
        let u_row = user_factors.row(u);
        let i_row = item_factors.row(i);
        let p = sigmoid(dot(u_row, i_row));
        let y = label as f64;
        let p_clip = p.clamp(PROB_EPS, 1.0 - PROB_EPS);
        loss -= y * p_clip.ln() + (1.0 - y) * (1.0 - p_clip).ln();

        // d(BCE)/d(logit) = p - y
        let g = ((p - y) / n) as f32;
        for (gu, &iv) in user_grad.row_mut(u).iter_mut().zip(i_row) {
            *gu += g * iv;
        }
        for (gi, &uv) in item_grad.row_mut(i).iter_mut().zip(u_row) {
            *gi += g * uv;
        }
    }
    loss / n
}

#[inline]
fn add_l2(grad: &mut FactorMatrix, params: &FactorMatrix, l2: f64) {
    let l2 = l2 as f32;
    grad.as_mut_slice()
        .iter_mut()
        .zip(params.as_slice())
        .for_each(|(g, p)| *g += l2 * p);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerKind;

    fn two_taste_dataset() -> Vec<InteractionRecord> {
        // users a*, b* はそれぞれ別の item 群を好む
        let mut records = Vec::new();
        for u in ["a1", "a2", "a3"] {
            for i in ["x1", "x2", "x3"] {
                records.push(InteractionRecord::new(u, i));
            }
        }
        for u in ["b1", "b2", "b3"] {
            for i in ["y1", "y2", "y3"] {
                records.push(InteractionRecord::new(u, i));
            }
        }
        records
    }

    fn config(epochs: usize) -> TrainerConfig {
        TrainerConfig {
            factors: 8,
            learning_rate: 0.05,
            epochs,
            optimizer: OptimizerKind::Adam,
            negatives_per_positive: 2,
            l2: 0.0,
            init_scale: 0.1,
            seed: 7,
        }
    }

    #[test]
    fn empty_input_is_insufficient_data() {
        let trainer = Trainer::new(TrainerConfig::default()).unwrap();
        assert!(matches!(trainer.fit(&[]), Err(EngineError::InsufficientData(_))));
    }

    #[test]
    fn shapes_follow_vocabulary() {
        let trainer = Trainer::new(config(3)).unwrap();
        let model = trainer.fit(&two_taste_dataset()).unwrap();
        assert_eq!(model.users.len(), 6);
        assert_eq!(model.items.len(), 6);
        assert_eq!(model.factors.users.rows(), 6);
        assert_eq!(model.factors.items.rows(), 6);
        assert_eq!(model.factors.dim(), 8);
        assert_eq!(model.loss_history.len(), 3);
    }

    #[test]
    fn loss_goes_down() {
        let trainer = Trainer::new(config(150)).unwrap();
        let model = trainer.fit(&two_taste_dataset()).unwrap();
        let first = model.loss_history[0];
        let last = *model.loss_history.last().unwrap();
        assert!(first > 0.6, "initial loss near ln 2, got {}", first);
        assert!(last < first * 0.5, "loss {} -> {}", first, last);
        // 後半 10 epoch の平均は前半 10 epoch の平均より小さい
        let head: f64 = model.loss_history[..10].iter().sum::<f64>() / 10.0;
        let tail: f64 = model.loss_history[140..].iter().sum::<f64>() / 10.0;
        assert!(tail < head);
    }

    #[test]
    fn sgd_also_reduces_loss() {
        let mut cfg = config(200);
        cfg.optimizer = OptimizerKind::Sgd;
        cfg.learning_rate = 1.0;
        cfg.init_scale = 0.5;
        let model = Trainer::new(cfg).unwrap().fit(&two_taste_dataset()).unwrap();
        assert!(model.loss_history.last().unwrap() < &model.loss_history[0]);
    }

    #[test]
    fn learns_group_preference() {
        let model = Trainer::new(config(150)).unwrap().fit(&two_taste_dataset()).unwrap();
        let a1 = model.users.encode(&UserId::from("a1")).unwrap();
        let x1 = model.items.encode(&ItemId::from("x1")).unwrap();
        let y1 = model.items.encode(&ItemId::from("y1")).unwrap();
        assert!(model.factors.affinity(a1, x1) > model.factors.affinity(a1, y1));
    }

    #[test]
    fn same_seed_is_reproducible() {
        let records = two_taste_dataset();
        let a = Trainer::new(config(5)).unwrap().fit(&records).unwrap();
        let b = Trainer::new(config(5)).unwrap().fit(&records).unwrap();
        assert_eq!(a.factors, b.factors);
        assert_eq!(a.loss_history, b.loss_history);
    }

    #[test]
    fn single_item_vocabulary_is_allowed() {
        let records = vec![InteractionRecord::new("u1", "only"), InteractionRecord::new("u2", "only")];
        let model = Trainer::new(config(5)).unwrap().fit(&records).unwrap();
        assert_eq!(model.items.len(), 1);
        assert_eq!(model.factors.items.rows(), 1);
    }
}
