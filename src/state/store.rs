use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// On-disk snapshot of every layer's trainable parameters, tagged with the
/// global step it was taken at.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    step: u64,
    layers: Vec<LayerState>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LayerState {
    weights: Matrix,
    biases: Matrix,
}

/// Saves and restores network parameters so training can resume across
/// independent invocations. A logical path plus step number identifies a
/// snapshot; the stored file embeds the step.
pub struct Store;

impl Store {
    /// Serializes the network's weights and biases to
    /// `{path}-{step}.json`, creating parent directories as needed.
    /// Returns the actual stored location.
    pub fn save(network: &Network, path: &Path, step: u64) -> Result<PathBuf> {
        let stored = Store::stored_path(path, step);
        if let Some(parent) = stored.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let snapshot = Snapshot {
            step,
            layers: network
                .layers()
                .iter()
                .map(|layer| LayerState {
                    weights: layer.weights().clone(),
                    biases: layer.biases().clone(),
                })
                .collect(),
        };

        let file = File::create(&stored)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, &snapshot)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        tracing::debug!(path = %stored.display(), step, "saved parameter snapshot");
        Ok(stored)
    }

    /// Loads a snapshot into the network, in the layer order it was saved.
    /// Fails with `StateMismatch` when the snapshot's layer count or shapes
    /// disagree with the network. Returns the snapshot's step number.
    pub fn restore(network: &mut Network, stored: &Path) -> Result<u64> {
        let file = File::open(stored).map_err(|err| {
            Error::StateMismatch(format!(
                "no snapshot at '{}': {}",
                stored.display(),
                err
            ))
        })?;
        let reader = BufReader::new(file);
        let snapshot: Snapshot = serde_json::from_reader(reader)
            .map_err(|e| Error::StateMismatch(format!("unreadable snapshot: {}", e)))?;

        network.load_parameters(
            snapshot
                .layers
                .into_iter()
                .map(|l| (l.weights, l.biases))
                .collect(),
        )?;
        tracing::debug!(path = %stored.display(), step = snapshot.step, "restored parameter snapshot");
        Ok(snapshot.step)
    }

    fn stored_path(path: &Path, step: u64) -> PathBuf {
        PathBuf::from(format!("{}-{}.json", path.display(), step))
    }
}
