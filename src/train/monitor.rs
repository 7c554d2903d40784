use crate::layers::dense::DenseLayer;
use crate::math::matrix::Matrix;

/// Which of a layer's tensors a monitor watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorKind {
    Input,
    Output,
    Weights,
    Biases,
}

impl TensorKind {
    fn label(&self) -> &'static str {
        match self {
            TensorKind::Input => "in",
            TensorKind::Output => "out",
            TensorKind::Weights => "wgt",
            TensorKind::Biases => "bias",
        }
    }
}

/// A (layer, tensor) pair selected for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub layer: usize,
    pub kind: TensorKind,
}

/// Labeled numeric copy of a monitored tensor at a point in time. Consumers
/// (plotting, dendrograms) live outside the harness; this is data only.
#[derive(Debug, Clone)]
pub struct TensorSnapshot {
    pub name: String,
    pub values: Matrix,
}

/// Scalar and distribution statistics over one monitored tensor.
#[derive(Debug, Clone)]
pub struct ProbeStats {
    pub name: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Fixed-width bin counts between `min` and `max`.
    pub histogram: Vec<usize>,
}

pub const HISTOGRAM_BINS: usize = 10;

impl Monitor {
    /// Reads the monitored tensor from its layer.
    pub fn grab(&self, layer: &DenseLayer) -> TensorSnapshot {
        let values = match self.kind {
            TensorKind::Input => layer.input().clone(),
            TensorKind::Output => layer.output().clone(),
            TensorKind::Weights => layer.weights().clone(),
            TensorKind::Biases => layer.biases().clone(),
        };
        TensorSnapshot {
            name: format!("layer-{}-{}", self.layer, self.kind.label()),
            values,
        }
    }

    /// Summary statistics of the monitored tensor.
    pub fn probe(&self, layer: &DenseLayer) -> ProbeStats {
        let snapshot = self.grab(layer);
        probe_stats(snapshot.name, &snapshot.values)
    }
}

fn probe_stats(name: String, values: &Matrix) -> ProbeStats {
    let n = values.len();
    if n == 0 {
        return ProbeStats {
            name,
            mean: 0.0,
            min: 0.0,
            max: 0.0,
            histogram: vec![0; HISTOGRAM_BINS],
        };
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for v in values.iter_all() {
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    let mut histogram = vec![0usize; HISTOGRAM_BINS];
    let span = max - min;
    for v in values.iter_all() {
        let bin = if span == 0.0 {
            0
        } else {
            (((v - min) / span * HISTOGRAM_BINS as f64) as usize).min(HISTOGRAM_BINS - 1)
        };
        histogram[bin] += 1;
    }
    ProbeStats {
        name,
        mean: sum / n as f64,
        min,
        max,
        histogram,
    }
}
