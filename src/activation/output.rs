use crate::error::Error;
use crate::math::matrix::Matrix;
use std::str::FromStr;

/// Optional transform applied to the last layer's activated output.
///
/// `Softmax` is vector-valued and normalizes each batch row independently;
/// the other variants are element-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFunction {
    Linear,
    Softmax,
    Sigmoid,
}

pub const OUTPUT_NAMES: &[&str] = &["linear", "softmax", "sigmoid"];

impl OutputFunction {
    /// Applies the output transform to a batch (one case per row).
    pub fn apply(&self, batch: &Matrix) -> Matrix {
        match self {
            OutputFunction::Linear => batch.clone(),
            OutputFunction::Sigmoid => batch.map(|x| 1.0 / (1.0 + (-x).exp())),
            OutputFunction::Softmax => {
                let data = batch
                    .data
                    .iter()
                    .map(|row| {
                        // Shift by the row max so exp() cannot overflow.
                        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                        let exps: Vec<f64> = row.iter().map(|&x| (x - max).exp()).collect();
                        let sum: f64 = exps.iter().sum();
                        exps.iter().map(|&e| e / sum).collect()
                    })
                    .collect();
                Matrix::from_data(data)
            }
        }
    }

    /// Pulls the loss gradient back through the output transform.
    ///
    /// `output` is the transformed batch, `grad` is dL/d(output). Returns
    /// dL/d(input of the transform). For Softmax this is the full
    /// Jacobian-vector product per row, so it composes correctly with any
    /// loss; paired with cross-entropy the result reduces to the familiar
    /// `output - target`.
    pub fn backward(&self, output: &Matrix, grad: &Matrix) -> Matrix {
        match self {
            OutputFunction::Linear => grad.clone(),
            OutputFunction::Sigmoid => grad.hadamard(&output.map(|o| o * (1.0 - o))),
            OutputFunction::Softmax => {
                let data = output
                    .data
                    .iter()
                    .zip(grad.data.iter())
                    .map(|(o_row, g_row)| {
                        let dot: f64 = o_row.iter().zip(g_row.iter()).map(|(o, g)| o * g).sum();
                        o_row
                            .iter()
                            .zip(g_row.iter())
                            .map(|(o, g)| o * (g - dot))
                            .collect()
                    })
                    .collect();
                Matrix::from_data(data)
            }
        }
    }
}

impl FromStr for OutputFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(OutputFunction::Linear),
            "softmax" => Ok(OutputFunction::Softmax),
            "sigmoid" => Ok(OutputFunction::Sigmoid),
            other => Err(Error::Config(format!(
                "'{}' is invalid for the output activation function; legal values are: {}",
                other,
                OUTPUT_NAMES.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_rows_sum_to_one() {
        let batch = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![0.0, 0.0, 0.0]]);
        let out = OutputFunction::Softmax.apply(&batch);
        for row in &out.data {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn softmax_backward_matches_combined_ce_gradient() {
        // With g = -t/o (cross-entropy gradient) the Jacobian-vector product
        // must reduce to o - t for a one-hot target.
        let logits = Matrix::from_data(vec![vec![0.3, 1.1, -0.7]]);
        let out = OutputFunction::Softmax.apply(&logits);
        let target = [0.0, 1.0, 0.0];
        let grad = Matrix::from_data(vec![out.data[0]
            .iter()
            .zip(target.iter())
            .map(|(o, t)| -t / o)
            .collect()]);
        let back = OutputFunction::Softmax.backward(&out, &grad);
        for j in 0..3 {
            let expected = out.data[0][j] - target[j];
            assert!((back.data[0][j] - expected).abs() < 1e-9);
        }
    }
}
