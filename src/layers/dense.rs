use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;
use rand::Rng;

/// How a layer's weight matrix is filled at construction.
///
/// Biases are always drawn uniformly from the configured weight range,
/// whichever variant the weights use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightInit {
    /// Each element uniform in [low, high).
    Uniform { low: f64, high: f64 },
    /// Fan-in-variance-scaled normal draw; `low`/`high` still bound the
    /// bias initialization.
    FanInScaled { low: f64, high: f64 },
}

impl WeightInit {
    pub fn range(&self) -> (f64, f64) {
        match *self {
            WeightInit::Uniform { low, high } | WeightInit::FanInScaled { low, high } => {
                (low, high)
            }
        }
    }
}

/// One fully-connected layer: weights (insize × outsize), a bias row, and an
/// activation. Transforms a batch as `output = f(input · weights + biases)`.
///
/// The layer caches its last input, pre-activation and output so the
/// backward pass and the monitoring facility can read them; no learning
/// logic lives here.
#[derive(Debug)]
pub struct DenseLayer {
    pub insize: usize,
    pub outsize: usize,
    weights: Matrix,
    biases: Matrix,
    activator: ActivationFunction,
    input: Matrix,
    pre_activation: Matrix,
    output: Matrix,
}

impl DenseLayer {
    pub fn new<R: Rng>(
        insize: usize,
        outsize: usize,
        activator: ActivationFunction,
        init: WeightInit,
        rng: &mut R,
    ) -> DenseLayer {
        let (low, high) = init.range();
        let weights = match init {
            WeightInit::Uniform { .. } => Matrix::uniform(insize, outsize, low, high, rng),
            WeightInit::FanInScaled { .. } => Matrix::fan_in_scaled(insize, outsize, rng),
        };
        let biases = Matrix::uniform(1, outsize, low, high, rng);

        DenseLayer {
            insize,
            outsize,
            weights,
            biases,
            activator,
            input: Matrix::default(),
            pre_activation: Matrix::default(),
            output: Matrix::default(),
        }
    }

    /// Forward transform of a batch (one case per row). Caches input,
    /// pre-activation and output for the backward pass and monitoring.
    pub fn forward(&mut self, input: &Matrix) -> Matrix {
        let z = (input.clone() * self.weights.clone()).add_rowvec(&self.biases);
        let a = z.map(|x| self.activator.function(x));
        self.input = input.clone();
        self.pre_activation = z;
        self.output = a.clone();
        a
    }

    /// Backward step from dL/d(output) of this layer.
    ///
    /// Returns (weight gradient, bias gradient, dL/d(input)), with the
    /// gradients already averaged over the batch.
    pub fn compute_gradients(&self, output_grad: &Matrix) -> (Matrix, Matrix, Matrix) {
        // δ = dL/da ⊙ f'(z), evaluated at the cached pre-activation.
        let act_derivative = self.pre_activation.map(|x| self.activator.derivative(x));
        let delta = output_grad.hadamard(&act_derivative);

        let inv_batch = 1.0 / delta.rows as f64;
        let weights_grad = (self.input.transpose() * delta.clone()).map(|x| x * inv_batch);
        let biases_grad = delta.column_sums().map(|x| x * inv_batch);
        let input_grad = delta * self.weights.transpose();

        (weights_grad, biases_grad, input_grad)
    }

    /// Applies pre-computed update deltas scaled by lr. Called exactly once
    /// per training step by the optimizer.
    pub fn apply_gradients(&mut self, weights_step: Matrix, biases_step: Matrix, lr: f64) {
        self.weights = self.weights.clone() - weights_step.map(|x| x * lr);
        self.biases = self.biases.clone() - biases_step.map(|x| x * lr);
    }

    /// Overwrites the trainable parameters, used when restoring a snapshot.
    /// Shape agreement is the caller's responsibility.
    pub fn set_parameters(&mut self, weights: Matrix, biases: Matrix) {
        self.weights = weights;
        self.biases = biases;
    }

    // Read-only tensor accessors for monitoring and persistence.

    pub fn input(&self) -> &Matrix {
        &self.input
    }

    pub fn output(&self) -> &Matrix {
        &self.output
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }
}
