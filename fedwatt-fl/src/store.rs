//! Trained artifact persistence
//!
//! A finished run persists three files into one artifact directory:
//!
//! - `weights.fwt`   binary dump of the global weight tensors
//! - `scaler.json`   the fitted feature scaling transform
//! - `manifest.json` feature names, architecture, and run summary
//!
//! Predictions are meaningless without the matching normalization, so
//! the three files form one bundle that is saved and loaded together.
//! Each file is written to a temporary name and renamed into place, and
//! the manifest is renamed last: a directory without a readable
//! manifest is an incomplete bundle and refuses to load.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::{Buf, BufMut, BytesMut};
use fedwatt_model::{ScalingTransform, ShapeSignature, TensorShape, WeightSet, WeightTensor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Magic bytes and version tag of the weight dump format
const WEIGHTS_MAGIC: &[u8; 4] = b"FWT1";

/// Upper bound on tensors in one dump, to reject garbage headers early
const MAX_TENSORS: usize = 1024;

/// Upper bound on tensor rank in one dump
const MAX_RANK: usize = 8;

/// Errors raised while persisting or loading artifact bundles
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A bundle file is missing from the artifact directory
    #[error("Artifact bundle in {} is incomplete: missing {file}", dir.display())]
    Incomplete {
        /// Artifact directory that was inspected
        dir: PathBuf,
        /// Name of the missing file
        file: String,
    },

    /// The weight dump is structurally invalid
    #[error("Invalid weight dump: {reason}")]
    InvalidFormat {
        /// What failed to parse
        reason: String,
    },

    /// The weight dump ended before the declared content
    #[error("Weight dump too short: needed {needed} more bytes, {available} available")]
    BufferTooShort {
        /// Bytes still required by the declared structure
        needed: usize,
        /// Bytes remaining in the dump
        available: usize,
    },

    /// The bundle files disagree with each other
    #[error("Artifact bundle is inconsistent: {reason}")]
    Inconsistent {
        /// Which cross-check failed
        reason: String,
    },
}

/// Everything needed to rebuild the predictor from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Version tag of the weight dump format
    pub format: String,
    /// Feature names in column order
    pub feature_names: Vec<String>,
    /// Hidden layer widths of the regressor
    pub hidden_layers: Vec<usize>,
    /// Shape signature of the persisted weights
    pub signature: ShapeSignature,
    /// Number of federation rounds the weights were trained for
    pub rounds: u32,
    /// Mean local loss of the final round, if any round completed
    pub final_loss: Option<f32>,
}

/// One complete persisted training result
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    /// Final global weights
    pub weights: WeightSet,
    /// Scaling transform fitted on the training data
    pub scaler: ScalingTransform,
    /// Bundle manifest
    pub manifest: ArtifactManifest,
}

/// Reads and writes artifact bundles under one directory
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    const WEIGHTS_FILE: &'static str = "weights.fwt";
    const SCALER_FILE: &'static str = "scaler.json";
    const MANIFEST_FILE: &'static str = "manifest.json";

    /// Creates a store over the given artifact directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the artifact directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns true if the directory holds a complete bundle marker
    pub fn is_complete(&self) -> bool {
        self.dir.join(Self::MANIFEST_FILE).exists()
    }

    /// Persists a bundle, creating the directory if needed.
    ///
    /// The manifest is written last so a crash mid-save leaves a
    /// directory that loads as incomplete instead of silently mixing
    /// old and new files.
    pub fn save(&self, bundle: &ArtifactBundle) -> Result<(), StoreError> {
        check_bundle(bundle)?;
        fs::create_dir_all(&self.dir)?;

        let weights = encode_weights(&bundle.weights);
        write_atomic(&self.dir.join(Self::WEIGHTS_FILE), &weights)?;

        let scaler = serde_json::to_vec_pretty(&bundle.scaler)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.dir.join(Self::SCALER_FILE), &scaler)?;

        let manifest = serde_json::to_vec_pretty(&bundle.manifest)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        write_atomic(&self.dir.join(Self::MANIFEST_FILE), &manifest)?;

        info!("Saved artifact bundle to {}", self.dir.display());
        Ok(())
    }

    /// Loads and cross-validates the bundle.
    ///
    /// A missing file, an unreadable dump, or files that disagree with
    /// the manifest all fail the load; there is no partial result.
    pub fn load(&self) -> Result<ArtifactBundle, StoreError> {
        let manifest_bytes = self.read_bundle_file(Self::MANIFEST_FILE)?;
        let manifest: ArtifactManifest = serde_json::from_slice(&manifest_bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if manifest.format.as_bytes() != WEIGHTS_MAGIC {
            return Err(StoreError::InvalidFormat {
                reason: format!("unsupported bundle format {:?}", manifest.format),
            });
        }

        let weight_bytes = self.read_bundle_file(Self::WEIGHTS_FILE)?;
        let weights = decode_weights(&weight_bytes)?;
        if weights.signature() != manifest.signature {
            return Err(StoreError::Inconsistent {
                reason: format!(
                    "weight dump signature {} does not match manifest {}",
                    weights.signature(),
                    manifest.signature
                ),
            });
        }

        let scaler_bytes = self.read_bundle_file(Self::SCALER_FILE)?;
        let scaler: ScalingTransform = serde_json::from_slice(&scaler_bytes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let bundle = ArtifactBundle {
            weights,
            scaler,
            manifest,
        };
        check_bundle(&bundle)?;
        Ok(bundle)
    }

    fn read_bundle_file(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Err(StoreError::Incomplete {
                dir: self.dir.clone(),
                file: name.to_string(),
            });
        }
        Ok(fs::read(path)?)
    }
}

/// Cross-checks the pieces of a bundle against its manifest
fn check_bundle(bundle: &ArtifactBundle) -> Result<(), StoreError> {
    let signature = bundle.weights.signature();
    if signature != bundle.manifest.signature {
        return Err(StoreError::Inconsistent {
            reason: format!(
                "weights have signature {}, manifest says {}",
                signature, bundle.manifest.signature
            ),
        });
    }
    let features = bundle.manifest.feature_names.len();
    if bundle.scaler.num_features() != features {
        return Err(StoreError::Inconsistent {
            reason: format!(
                "scaler covers {} features, manifest names {}",
                bundle.scaler.num_features(),
                features
            ),
        });
    }
    Ok(())
}

/// Write-then-rename keeps readers from ever seeing a partial file
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Returns the exact byte length of `encode_weights` output
pub fn encoded_weights_size(weights: &WeightSet) -> usize {
    let mut size = WEIGHTS_MAGIC.len() + 4;
    for tensor in weights.tensors() {
        size += 1 + 4 * tensor.shape().rank() + 4 * tensor.len();
    }
    size
}

/// Encodes a weight set into the `FWT1` binary dump
pub fn encode_weights(weights: &WeightSet) -> BytesMut {
    let mut buf = BytesMut::with_capacity(encoded_weights_size(weights));
    encode_weights_to(weights, &mut buf);
    buf
}

/// Encodes a weight set into an existing buffer
pub fn encode_weights_to(weights: &WeightSet, buf: &mut BytesMut) {
    buf.put_slice(WEIGHTS_MAGIC);
    buf.put_u32(weights.len() as u32);
    for tensor in weights.tensors() {
        buf.put_u8(tensor.shape().rank() as u8);
        for &dim in tensor.shape().dims() {
            buf.put_u32(dim as u32);
        }
        for &value in tensor.data() {
            buf.put_f32(value);
        }
    }
}

/// Decodes an `FWT1` binary dump back into a weight set
pub fn decode_weights(data: &[u8]) -> Result<WeightSet, StoreError> {
    let mut buf = data;

    require(&buf, WEIGHTS_MAGIC.len() + 4)?;
    let mut magic = [0u8; 4];
    buf.copy_to_slice(&mut magic);
    if &magic != WEIGHTS_MAGIC {
        return Err(StoreError::InvalidFormat {
            reason: format!("bad magic {magic:02X?}"),
        });
    }

    let count = buf.get_u32() as usize;
    if count > MAX_TENSORS {
        return Err(StoreError::InvalidFormat {
            reason: format!("tensor count {count} exceeds limit {MAX_TENSORS}"),
        });
    }

    let mut tensors = Vec::with_capacity(count);
    for _ in 0..count {
        require(&buf, 1)?;
        let rank = buf.get_u8() as usize;
        if rank > MAX_RANK {
            return Err(StoreError::InvalidFormat {
                reason: format!("tensor rank {rank} exceeds limit {MAX_RANK}"),
            });
        }

        require(&buf, 4 * rank)?;
        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            dims.push(buf.get_u32() as usize);
        }
        let shape = TensorShape::new(dims);

        let elements = shape.num_elements();
        require(&buf, 4 * elements)?;
        let mut values = Vec::with_capacity(elements);
        for _ in 0..elements {
            values.push(buf.get_f32());
        }

        let tensor = WeightTensor::new(shape, values).map_err(|e| StoreError::InvalidFormat {
            reason: e.to_string(),
        })?;
        tensors.push(tensor);
    }

    Ok(WeightSet::new(tensors))
}

fn require(buf: &[u8], needed: usize) -> Result<(), StoreError> {
    if buf.remaining() < needed {
        return Err(StoreError::BufferTooShort {
            needed,
            available: buf.remaining(),
        });
    }
    Ok(())
}
