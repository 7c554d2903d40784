use crate::math::matrix::Matrix;

/// Categorical cross-entropy, intended for a Softmax output transform.
pub struct SoftmaxCeLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl SoftmaxCeLoss {
    /// Scalar loss: mean over the batch of -sum(expected · log(predicted)).
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let batch = predicted.rows as f64;
        predicted
            .data
            .iter()
            .zip(expected.data.iter())
            .map(|(p_row, e_row)| {
                p_row
                    .iter()
                    .zip(e_row.iter())
                    .map(|(p, e)| -e * (p + EPS).ln())
                    .sum::<f64>()
            })
            .sum::<f64>()
            / batch
    }

    /// Gradient w.r.t. the (post-softmax) output: -expected / predicted.
    ///
    /// The softmax Jacobian-vector product in `OutputFunction::backward`
    /// collapses this to `predicted - expected` w.r.t. the softmax input, so
    /// the combined gradient is never double-applied.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let data = predicted
            .data
            .iter()
            .zip(expected.data.iter())
            .map(|(p_row, e_row)| {
                p_row
                    .iter()
                    .zip(e_row.iter())
                    .map(|(p, e)| -e / (p + EPS))
                    .collect()
            })
            .collect();
        Matrix::from_data(data)
    }
}
