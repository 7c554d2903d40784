use crate::error::Error;
use crate::layers::dense::DenseLayer;
use crate::math::matrix::Matrix;
use crate::optim::adagrad::Adagrad;
use crate::optim::adam::Adam;
use crate::optim::rmsprop::RmsProp;
use crate::optim::sgd::Sgd;
use std::str::FromStr;

/// Optimizer selector as it appears on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    Gd,
    Adagrad,
    Adam,
    RmsProp,
}

pub const OPTIMIZER_NAMES: &[&str] = &["gd", "adagrad", "adam", "rmsprop"];

impl FromStr for OptimizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gd" => Ok(OptimizerKind::Gd),
            "adagrad" => Ok(OptimizerKind::Adagrad),
            "adam" => Ok(OptimizerKind::Adam),
            "rmsprop" => Ok(OptimizerKind::RmsProp),
            other => Err(Error::Config(format!(
                "'{}' is invalid for the optimizer; legal values are: {}",
                other,
                OPTIMIZER_NAMES.join(", ")
            ))),
        }
    }
}

/// A bound optimizer instance. The stateful variants carry per-layer
/// accumulators, so one instance serves exactly one network.
#[derive(Debug)]
pub enum Optimizer {
    Gd(Sgd),
    Adagrad(Adagrad),
    Adam(Adam),
    RmsProp(RmsProp),
}

impl Optimizer {
    pub fn new(kind: OptimizerKind, learning_rate: f64) -> Optimizer {
        match kind {
            OptimizerKind::Gd => Optimizer::Gd(Sgd::new(learning_rate)),
            OptimizerKind::Adagrad => Optimizer::Adagrad(Adagrad::new(learning_rate)),
            OptimizerKind::Adam => Optimizer::Adam(Adam::new(learning_rate)),
            OptimizerKind::RmsProp => Optimizer::RmsProp(RmsProp::new(learning_rate)),
        }
    }

    /// Applies one parameter update to `layer` from its batch-averaged
    /// gradients.
    pub fn step(
        &mut self,
        layer_index: usize,
        layer: &mut DenseLayer,
        weights_grad: Matrix,
        biases_grad: Matrix,
    ) {
        match self {
            Optimizer::Gd(o) => o.step(layer, weights_grad, biases_grad),
            Optimizer::Adagrad(o) => o.step(layer_index, layer, weights_grad, biases_grad),
            Optimizer::Adam(o) => o.step(layer_index, layer, weights_grad, biases_grad),
            Optimizer::RmsProp(o) => o.step(layer_index, layer, weights_grad, biases_grad),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::dense::WeightInit;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn unit_layer() -> DenseLayer {
        let mut rng = StdRng::seed_from_u64(1);
        let mut layer = DenseLayer::new(
            1,
            1,
            ActivationFunction::Relu,
            WeightInit::Uniform {
                low: 0.0,
                high: 0.0,
            },
            &mut rng,
        );
        layer.set_parameters(
            Matrix::from_data(vec![vec![1.0]]),
            Matrix::from_data(vec![vec![0.0]]),
        );
        layer
    }

    #[test]
    fn gd_moves_against_gradient() {
        let mut layer = unit_layer();
        let mut opt = Optimizer::new(OptimizerKind::Gd, 0.5);
        opt.step(
            0,
            &mut layer,
            Matrix::from_data(vec![vec![1.0]]),
            Matrix::from_data(vec![vec![-2.0]]),
        );
        assert_eq!(layer.weights().data[0][0], 0.5);
        assert_eq!(layer.biases().data[0][0], 1.0);
    }

    #[test]
    fn adam_first_step_is_unit_scaled() {
        // After one step m̂/√v̂ = g/|g|, so the update magnitude is lr.
        let mut layer = unit_layer();
        let mut opt = Optimizer::new(OptimizerKind::Adam, 0.1);
        opt.step(
            0,
            &mut layer,
            Matrix::from_data(vec![vec![4.0]]),
            Matrix::from_data(vec![vec![0.0]]),
        );
        assert!((layer.weights().data[0][0] - 0.9).abs() < 1e-6);
    }

    #[test]
    fn unknown_optimizer_selector_is_config_error() {
        let err = "lbfgs".parse::<OptimizerKind>().unwrap_err();
        assert!(err.to_string().contains("rmsprop"));
    }
}
