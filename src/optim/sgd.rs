use crate::layers::dense::DenseLayer;
use crate::math::matrix::Matrix;

/// Plain gradient descent: θ = θ - lr · g. Stateless.
#[derive(Debug)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one descent update to a layer given its batch-averaged
    /// gradients.
    pub fn step(&self, layer: &mut DenseLayer, weights_grad: Matrix, biases_grad: Matrix) {
        layer.apply_gradients(weights_grad, biases_grad, self.learning_rate);
    }
}
