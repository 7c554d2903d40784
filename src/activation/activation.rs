use crate::error::Error;
use std::str::FromStr;

/// Hidden-layer activation, applied element-wise by every `DenseLayer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationFunction {
    Sigmoid,
    Relu,
    Relu6,
    Elu,
    Tanh,
}

pub const ACTIVATION_NAMES: &[&str] = &["sigmoid", "relu", "relu6", "elu", "tanh"];

impl ActivationFunction {
    /// Element-wise activation.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::Relu => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            ActivationFunction::Relu6 => x.max(0.0).min(6.0),
            ActivationFunction::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp() - 1.0
                }
            }
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Element-wise derivative of the activation, evaluated at the
    /// pre-activation value z.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ActivationFunction::Relu6 => {
                if x > 0.0 && x < 6.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ActivationFunction::Elu => {
                if x > 0.0 {
                    1.0
                } else {
                    x.exp()
                }
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }
}

impl FromStr for ActivationFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "relu" => Ok(ActivationFunction::Relu),
            "relu6" => Ok(ActivationFunction::Relu6),
            "elu" => Ok(ActivationFunction::Elu),
            "tanh" => Ok(ActivationFunction::Tanh),
            other => Err(Error::Config(format!(
                "'{}' is invalid for the hidden activation function; legal values are: {}",
                other,
                ACTIVATION_NAMES.join(", ")
            ))),
        }
    }
}
