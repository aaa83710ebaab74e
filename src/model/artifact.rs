use std::fmt;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::codec::{IdCodec, ItemId, UserId};
use crate::error::{EngineError, Result};
use crate::model::trainer::TrainedModel;
use crate::model::{FactorMatrix, FactorTable};

/// Identifier of one training run
/// Factor and codec artifacts carry it so a loader can refuse a mismatched pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// `<unix seconds>-<random hex>`
    pub fn generate() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        RunId(format!("{}-{:08x}", secs, rand::random::<u32>()))
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persisted factor matrices, keyed by space
#[derive(Debug, Serialize, Deserialize)]
pub struct FactorArtifact {
    pub run_id: RunId,
    pub user: FactorMatrix,
    pub item: FactorMatrix,
}

/// Persisted id <-> index tables
#[derive(Debug, Serialize, Deserialize)]
pub struct CodecArtifact {
    pub run_id: RunId,
    pub users: IdCodec<UserId>,
    pub items: IdCodec<ItemId>,
}

/// Where one training run's artifacts live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub factors: PathBuf,
    pub codec: PathBuf,
}

impl ArtifactPaths {
    pub const FACTORS_FILE: &'static str = "factors.cbor";
    pub const CODEC_FILE: &'static str = "codec.cbor";

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            factors: dir.join(Self::FACTORS_FILE),
            codec: dir.join(Self::CODEC_FILE),
        }
    }
}

impl TrainedModel {
    /// Write factors and codec, each stamped with this run's id
    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        let factors = FactorArtifact {
            run_id: self.run_id.clone(),
            user: self.factors.users.clone(),
            item: self.factors.items.clone(),
        };
        let codec = CodecArtifact {
            run_id: self.run_id.clone(),
            users: self.users.clone(),
            items: self.items.clone(),
        };
        write_cbor(&paths.factors, &factors)?;
        write_cbor(&paths.codec, &codec)?;
        info!(run_id = %self.run_id, factors = ?paths.factors, codec = ?paths.codec, "saved model artifacts");
        Ok(())
    }

    /// Load a matched factor/codec pair
    /// Fails with `ArtifactMismatch` if the two files come from different runs.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let factors: FactorArtifact = read_cbor(&paths.factors)?;
        let codec: CodecArtifact = read_cbor(&paths.codec)?;
        if factors.run_id != codec.run_id {
            return Err(EngineError::ArtifactMismatch {
                factors: factors.run_id.0,
                codec: codec.run_id.0,
            });
        }
        factors.user.check_shape()?;
        factors.item.check_shape()?;
        if factors.user.rows() != codec.users.len() || factors.item.rows() != codec.items.len() {
            return Err(EngineError::Serialization(format!(
                "run {}: factor rows ({}, {}) do not match codec sizes ({}, {})",
                codec.run_id,
                factors.user.rows(),
                factors.item.rows(),
                codec.users.len(),
                codec.items.len()
            )));
        }
        info!(run_id = %codec.run_id, users = codec.users.len(), items = codec.items.len(), "loaded model artifacts");
        Ok(TrainedModel {
            run_id: codec.run_id,
            factors: FactorTable::new(factors.user, factors.item)?,
            users: codec.users,
            items: codec.items,
            loss_history: Vec::new(),
        })
    }
}

/// 一時ファイルに書いてから rename する
/// 読み手が書きかけのファイルを見ることはない
pub(crate) fn write_cbor<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut writer = BufWriter::new(fs::File::create(&tmp)?);
        serde_cbor::to_writer(&mut writer, value)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub(crate) fn read_cbor<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(fs::File::open(path)?);
    Ok(serde_cbor::from_reader(reader)?)
}
