use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::{Error, Result};

/// Where a network's two companion files live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelArtifact {
    pub topology: PathBuf,
    pub weights: PathBuf,
}

impl ModelArtifact {
    pub fn new(topology: impl Into<PathBuf>, weights: impl Into<PathBuf>) -> Self {
        Self {
            topology: topology.into(),
            weights: weights.into(),
        }
    }
}

/// Topology and weights held in memory, not yet bound to a device.
#[derive(Clone, Debug)]
pub struct NetworkDescriptor {
    pub artifact: ModelArtifact,
    pub topology: Bytes,
    pub weights: Bytes,
}

/// Reads both files of `artifact` into a [`NetworkDescriptor`].
pub fn load_network(artifact: &ModelArtifact) -> Result<NetworkDescriptor> {
    let topology = read_nonempty(&artifact.topology)?;
    if std::str::from_utf8(&topology).is_err() {
        return Err(Error::ModelParse {
            path: artifact.topology.clone(),
            reason: "topology is not a UTF-8 document".to_string(),
        });
    }
    let weights = read_nonempty(&artifact.weights)?;

    debug!(
        topology = %artifact.topology.display(),
        topology_bytes = topology.len(),
        weights_bytes = weights.len(),
        "network descriptor loaded"
    );

    Ok(NetworkDescriptor {
        artifact: artifact.clone(),
        topology,
        weights,
    })
}

fn read_nonempty(path: &Path) -> Result<Bytes> {
    let data = std::fs::read(path).map_err(|e| Error::ModelParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if data.is_empty() {
        return Err(Error::ModelParse {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }
    Ok(Bytes::from(data))
}
