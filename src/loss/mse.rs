use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE over a batch: mean((predicted - expected)²) over all
    /// elements.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = predicted.len() as f64;
        predicted
            .iter_all()
            .zip(expected.iter_all())
            .map(|(p, e)| (p - e).powi(2))
            .sum::<f64>()
            / n
    }

    /// Per-output gradient: predicted - expected. The constant factor folds
    /// into the learning rate.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        predicted.clone() - expected.clone()
    }
}
