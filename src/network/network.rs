use crate::activation::activation::ActivationFunction;
use crate::activation::output::OutputFunction;
use crate::error::{Error, Result};
use crate::layers::dense::{DenseLayer, WeightInit};
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::optim::optimizer::{Optimizer, OptimizerKind};
use rand::Rng;

/// An ordered stack of dense layers plus the loss and optimizer bound to it.
///
/// Built from a full dimension list (input width first, output width last);
/// every layer applies the hidden activation, and the last layer's activated
/// output is additionally passed through the output function. Each instance
/// owns its parameters outright; rebuilding for a fresh run is just
/// constructing a new `Network`.
#[derive(Debug)]
pub struct Network {
    layers: Vec<DenseLayer>,
    output_function: OutputFunction,
    loss: LossType,
    optimizer: Optimizer,
}

impl Network {
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: Rng>(
        dims: &[usize],
        afunc: ActivationFunction,
        ofunc: OutputFunction,
        loss: LossType,
        optimizer: OptimizerKind,
        learning_rate: f64,
        init: WeightInit,
        rng: &mut R,
    ) -> Result<Network> {
        if dims.len() < 2 {
            return Err(Error::Config(format!(
                "a network needs at least an input and an output dimension, got {:?}",
                dims
            )));
        }
        let (low, high) = init.range();
        if low > high {
            return Err(Error::Config(format!(
                "weight range start ({}) is larger than finish ({})",
                low, high
            )));
        }

        // Thread each layer's output width into the next layer's input width.
        let layers = dims
            .windows(2)
            .map(|pair| DenseLayer::new(pair[0], pair[1], afunc, init, rng))
            .collect();

        Ok(Network {
            layers,
            output_function: ofunc,
            loss,
            optimizer: Optimizer::new(optimizer, learning_rate),
        })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.insize)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.outsize)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Fails fast when the network's end widths disagree with the dataset.
    pub fn check_dimensions(&self, input_width: usize, target_width: usize) -> Result<()> {
        if self.input_size() != input_width {
            return Err(Error::Config(format!(
                "first layer expects {} inputs but the dataset provides {}",
                self.input_size(),
                input_width
            )));
        }
        if self.output_size() != target_width {
            return Err(Error::Config(format!(
                "last layer produces {} outputs but the dataset targets have width {}",
                self.output_size(),
                target_width
            )));
        }
        Ok(())
    }

    /// Forward pass only; one case per row.
    pub fn predict(&mut self, input: &Matrix) -> Matrix {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current);
        }
        self.output_function.apply(&current)
    }

    /// One training step: forward, backward, one optimizer update per layer.
    /// Returns the loss value computed before the update is applied.
    pub fn forward_and_update(&mut self, input: &Matrix, target: &Matrix) -> f64 {
        let output = self.predict(input);
        let loss_value = self.loss.loss(&output, target);

        // dL/d(output), then back through the output transform to the last
        // layer's activation space.
        let output_grad = self.loss.derivative(&output, target);
        let mut delta = self.output_function.backward(&output, &output_grad);

        // Updating layer i before stepping to layer i-1 is safe: the
        // propagated delta was already computed from the pre-update weights.
        for i in (0..self.layers.len()).rev() {
            let (w_grad, b_grad, input_grad) = self.layers[i].compute_gradients(&delta);
            self.optimizer
                .step(i, &mut self.layers[i], w_grad, b_grad);
            delta = input_grad;
        }

        loss_value
    }

    /// Inference-only scoring. With `best_k` set, returns the count of cases
    /// whose target class lands in the k highest outputs; otherwise the mean
    /// loss over the batch.
    pub fn evaluate(&mut self, input: &Matrix, target: &Matrix, best_k: Option<usize>) -> f64 {
        let output = self.predict(input);
        match best_k {
            None => self.loss.loss(&output, target),
            Some(k) => {
                let correct = output
                    .data
                    .iter()
                    .zip(target.data.iter())
                    .filter(|(out_row, tgt_row)| {
                        let class = one_hot_to_index(tgt_row);
                        top_k_indices(out_row, k).contains(&class)
                    })
                    .count();
                correct as f64
            }
        }
    }

    /// Overwrites all layer parameters from a snapshot, in layer order.
    /// Fails with `StateMismatch` when the layer count or any shape differs.
    pub fn load_parameters(&mut self, params: Vec<(Matrix, Matrix)>) -> Result<()> {
        if params.len() != self.layers.len() {
            return Err(Error::StateMismatch(format!(
                "snapshot has {} layers but the network has {}",
                params.len(),
                self.layers.len()
            )));
        }
        for (i, ((weights, biases), layer)) in
            params.into_iter().zip(self.layers.iter_mut()).enumerate()
        {
            if !weights.same_shape(layer.weights()) || !biases.same_shape(layer.biases()) {
                return Err(Error::StateMismatch(format!(
                    "snapshot shape for layer {} is {}x{} but the network expects {}x{}",
                    i,
                    weights.rows,
                    weights.cols,
                    layer.weights().rows,
                    layer.weights().cols
                )));
            }
            layer.set_parameters(weights, biases);
        }
        Ok(())
    }
}

/// Indices of the k largest values; ties broken by the lowest index.
///
/// This is the strict top-k rule: an all-equal row yields the first k
/// indices, never a free match for every class.
fn top_k_indices(row: &[f64], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..row.len()).collect();
    idx.sort_by(|&a, &b| {
        row[b]
            .partial_cmp(&row[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    idx.truncate(k);
    idx
}

/// Index of the hot entry of a one-hot target (first maximum wins).
fn one_hot_to_index(target: &[f64]) -> usize {
    target
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(dims: &[usize]) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(3);
        Network::new(
            dims,
            ActivationFunction::Sigmoid,
            OutputFunction::Linear,
            LossType::Mse,
            OptimizerKind::Gd,
            0.1,
            WeightInit::Uniform {
                low: -0.1,
                high: 0.1,
            },
            &mut rng,
        )
    }

    #[test]
    fn construction_threads_layer_widths() {
        let net = build(&[4, 3, 2]).unwrap();
        assert_eq!(net.layers().len(), 2);
        assert_eq!(net.input_size(), 4);
        assert_eq!(net.output_size(), 2);
    }

    #[test]
    fn too_short_dims_is_config_error() {
        assert!(matches!(build(&[5]), Err(Error::Config(_))));
    }

    #[test]
    fn inverted_weight_range_is_config_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = Network::new(
            &[2, 2],
            ActivationFunction::Relu,
            OutputFunction::Linear,
            LossType::Mse,
            OptimizerKind::Gd,
            0.1,
            WeightInit::Uniform {
                low: 0.5,
                high: -0.5,
            },
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn dataset_width_mismatch_is_config_error() {
        let net = build(&[4, 3, 2]).unwrap();
        assert!(net.check_dimensions(4, 2).is_ok());
        assert!(matches!(net.check_dimensions(5, 2), Err(Error::Config(_))));
        assert!(matches!(net.check_dimensions(4, 3), Err(Error::Config(_))));
    }

    #[test]
    fn top_k_breaks_ties_by_lowest_index() {
        assert_eq!(top_k_indices(&[0.0, 0.0, 0.0], 1), vec![0]);
        assert_eq!(top_k_indices(&[1.0, 3.0, 3.0, 2.0], 2), vec![1, 2]);
    }

    #[test]
    fn evaluate_best1_counts_exact_matches() {
        // Zero-range init and linear output make every output zero; force the
        // output layer to echo its input by loading identity parameters.
        let mut rng = StdRng::seed_from_u64(5);
        let mut net = Network::new(
            &[3, 3],
            ActivationFunction::Relu,
            OutputFunction::Linear,
            LossType::Mse,
            OptimizerKind::Gd,
            0.1,
            WeightInit::Uniform {
                low: 0.0,
                high: 0.0,
            },
            &mut rng,
        )
        .unwrap();
        let identity = Matrix::from_data(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]);
        net.load_parameters(vec![(identity, Matrix::zeros(1, 3))])
            .unwrap();

        let cases = Matrix::from_data(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ]);
        let score = net.evaluate(&cases.clone(), &cases, Some(1));
        assert_eq!(score, 3.0);
    }

    #[test]
    fn zero_range_untrained_evaluation_is_deterministic() {
        let batch = Matrix::from_data(vec![vec![0.25, 0.75], vec![0.5, 0.5]]);
        let mut scores = Vec::new();
        for _ in 0..2 {
            let mut rng = StdRng::seed_from_u64(11);
            let mut net = Network::new(
                &[2, 2],
                ActivationFunction::Relu,
                OutputFunction::Linear,
                LossType::Mse,
                OptimizerKind::Gd,
                0.1,
                WeightInit::Uniform {
                    low: 0.0,
                    high: 0.0,
                },
                &mut rng,
            )
            .unwrap();
            scores.push(net.evaluate(&batch, &batch, None));
        }
        assert_eq!(scores[0], scores[1]);
    }

    #[test]
    fn training_reduces_loss_on_a_fixed_batch() {
        let mut net = build(&[2, 4, 1]).unwrap();
        let input = Matrix::from_data(vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        let target = Matrix::from_data(vec![vec![1.0], vec![0.0]]);
        let first = net.forward_and_update(&input, &target);
        let mut last = first;
        for _ in 0..200 {
            last = net.forward_and_update(&input, &target);
        }
        assert!(last < first);
    }

    #[test]
    fn adam_keeps_every_layer_finite_on_the_first_step() {
        // Layers update back-to-front, so a shared Adam timestep keyed to
        // layer 0 would bias-correct the later layers with t = 0 and blow
        // them up to NaN on the very first update.
        let mut rng = StdRng::seed_from_u64(7);
        let mut net = Network::new(
            &[2, 3, 2],
            ActivationFunction::Sigmoid,
            OutputFunction::Linear,
            LossType::Mse,
            OptimizerKind::Adam,
            0.01,
            WeightInit::Uniform {
                low: -0.1,
                high: 0.1,
            },
            &mut rng,
        )
        .unwrap();
        let input = Matrix::from_data(vec![vec![0.2, 0.8], vec![0.9, 0.1]]);
        let target = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        net.forward_and_update(&input, &target);
        for (i, layer) in net.layers().iter().enumerate() {
            assert!(
                layer.weights().iter_all().all(f64::is_finite),
                "layer {} weights became non-finite after one Adam step",
                i
            );
            assert!(layer.biases().iter_all().all(f64::is_finite));
        }
    }

    #[test]
    fn load_parameters_rejects_wrong_layer_count() {
        let mut net = build(&[2, 2]).unwrap();
        let err = net.load_parameters(vec![]).unwrap_err();
        assert!(matches!(err, Error::StateMismatch(_)));
    }
}
