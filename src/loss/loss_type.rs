use crate::error::Error;
use crate::loss::mse::MseLoss;
use crate::loss::softmax_ce::SoftmaxCeLoss;
use crate::math::matrix::Matrix;
use std::str::FromStr;

/// Selects which loss function the network is trained and scored with.
///
/// - `Mse`       — mean-squared error; pair with a linear or sigmoid output.
/// - `SoftmaxCe` — categorical cross-entropy; pair with a softmax output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossType {
    Mse,
    SoftmaxCe,
}

pub const LOSS_NAMES: &[&str] = &["mse", "softmax_ce"];

impl LossType {
    /// Scalar loss for a batch — dispatches on the variant.
    pub fn loss(&self, predicted: &Matrix, expected: &Matrix) -> f64 {
        match self {
            LossType::Mse => MseLoss::loss(predicted, expected),
            LossType::SoftmaxCe => SoftmaxCeLoss::loss(predicted, expected),
        }
    }

    /// Gradient of the loss w.r.t. the network output — dispatches on the
    /// variant.
    pub fn derivative(&self, predicted: &Matrix, expected: &Matrix) -> Matrix {
        match self {
            LossType::Mse => MseLoss::derivative(predicted, expected),
            LossType::SoftmaxCe => SoftmaxCeLoss::derivative(predicted, expected),
        }
    }
}

impl FromStr for LossType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mse" => Ok(LossType::Mse),
            "softmax_ce" => Ok(LossType::SoftmaxCe),
            other => Err(Error::Config(format!(
                "'{}' is invalid for the loss function; legal values are: {}",
                other,
                LOSS_NAMES.join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mse_of_identical_batches_is_zero() {
        let a = Matrix::from_data(vec![vec![0.5, 0.25], vec![1.0, 0.0]]);
        assert_eq!(LossType::Mse.loss(&a, &a.clone()), 0.0);
    }

    #[test]
    fn softmax_ce_penalizes_wrong_confident_prediction() {
        let confident_right = Matrix::from_data(vec![vec![0.9, 0.05, 0.05]]);
        let confident_wrong = Matrix::from_data(vec![vec![0.05, 0.9, 0.05]]);
        let target = Matrix::from_data(vec![vec![1.0, 0.0, 0.0]]);
        let right = LossType::SoftmaxCe.loss(&confident_right, &target);
        let wrong = LossType::SoftmaxCe.loss(&confident_wrong, &target);
        assert!(wrong > right);
    }

    #[test]
    fn unknown_loss_selector_is_config_error() {
        let err = "hinge".parse::<LossType>().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("softmax_ce"));
    }
}
