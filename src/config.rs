use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::rank::Signal;

/// Update rule used by the trainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// plain gradient descent
    Sgd,
    /// Adam (beta1 0.9, beta2 0.999)
    #[default]
    Adam,
}

/// Collaborative-filtering trainer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// latent factor dimension `k`
    pub factors: usize,
    /// learning rate `η`
    pub learning_rate: f64,
    pub epochs: usize,
    pub optimizer: OptimizerKind,
    /// unobserved items drawn per positive record as label 0
    /// 0 trains on positives only
    pub negatives_per_positive: usize,
    /// L2 penalty on the touched factor rows
    pub l2: f64,
    /// factors start uniform in `[-init_scale, init_scale]`
    pub init_scale: f64,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            factors: 32,
            learning_rate: 0.01,
            epochs: 10,
            optimizer: OptimizerKind::Adam,
            negatives_per_positive: 4,
            l2: 0.0,
            init_scale: 0.1,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.factors == 0 {
            return Err(EngineError::InvalidConfig("factors must be > 0".into()));
        }
        if self.epochs == 0 {
            return Err(EngineError::InvalidConfig("epochs must be > 0".into()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if !self.l2.is_finite() || self.l2 < 0.0 {
            return Err(EngineError::InvalidConfig(format!("l2 must be finite and >= 0, got {}", self.l2)));
        }
        if !self.init_scale.is_finite() || self.init_scale <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "init_scale must be finite and > 0, got {}",
                self.init_scale
            )));
        }
        Ok(())
    }
}

/// Weight of each signal in rank fusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub collaborative: f64,
    pub text: f64,
    pub image: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            collaborative: 1.0,
            text: 1.0,
            image: 1.0,
        }
    }
}

impl FusionWeights {
    pub fn uniform(weight: f64) -> Self {
        Self {
            collaborative: weight,
            text: weight,
            image: weight,
        }
    }

    #[inline]
    pub fn weight(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Collaborative => self.collaborative,
            Signal::Text => self.text,
            Signal::Image => self.image,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for signal in [Signal::Collaborative, Signal::Text, Signal::Image] {
            let w = self.weight(signal);
            if !w.is_finite() || w < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "weight for {:?} must be finite and >= 0, got {}",
                    signal, w
                )));
            }
        }
        Ok(())
    }
}

/// Top-level engine configuration
///
/// Every field has a default, so a partial JSON file is enough:
/// ```json
/// { "trainer": { "factors": 16, "epochs": 50 }, "default_top_k": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub trainer: TrainerConfig,
    pub fusion: FusionWeights,
    pub default_top_k: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trainer: TrainerConfig::default(),
            fusion: FusionWeights::default(),
            default_top_k: 10,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file and validate it
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.trainer.validate()?;
        self.fusion.validate()?;
        if self.default_top_k == 0 {
            return Err(EngineError::InvalidConfig("default_top_k must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "trainer": { "factors": 8, "optimizer": "sgd" } }"#).unwrap();
        assert_eq!(config.trainer.factors, 8);
        assert_eq!(config.trainer.optimizer, OptimizerKind::Sgd);
        assert_eq!(config.trainer.epochs, 10);
        assert_eq!(config.fusion, FusionWeights::default());
        assert_eq!(config.default_top_k, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.trainer.learning_rate = 0.0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.fusion.image = -1.0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.trainer.factors = 0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "default_top_k": 3, "fusion": { "text": 2.0 } }"#).unwrap();
        let config = EngineConfig::from_path(&path).unwrap();
        assert_eq!(config.default_top_k, 3);
        assert_eq!(config.fusion.text, 2.0);
        assert_eq!(config.fusion.image, 1.0);
    }
}
