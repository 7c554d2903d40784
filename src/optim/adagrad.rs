use crate::layers::dense::DenseLayer;
use crate::math::matrix::Matrix;

const EPS: f64 = 1e-8;

/// Adagrad: per-parameter learning rates from accumulated squared gradients.
///
/// Accumulators are allocated per layer on first use and live for the whole
/// training phase; they are not part of the persisted snapshot.
#[derive(Debug)]
pub struct Adagrad {
    pub learning_rate: f64,
    accum: Vec<(Matrix, Matrix)>,
}

impl Adagrad {
    pub fn new(learning_rate: f64) -> Adagrad {
        Adagrad {
            learning_rate,
            accum: Vec::new(),
        }
    }

    pub fn step(
        &mut self,
        layer_index: usize,
        layer: &mut DenseLayer,
        weights_grad: Matrix,
        biases_grad: Matrix,
    ) {
        while self.accum.len() <= layer_index {
            self.accum.push((Matrix::default(), Matrix::default()));
        }
        let (w_acc, b_acc) = &mut self.accum[layer_index];
        if !w_acc.same_shape(&weights_grad) {
            *w_acc = Matrix::zeros(weights_grad.rows, weights_grad.cols);
            *b_acc = Matrix::zeros(biases_grad.rows, biases_grad.cols);
        }

        *w_acc = w_acc.clone() + weights_grad.hadamard(&weights_grad);
        *b_acc = b_acc.clone() + biases_grad.hadamard(&biases_grad);

        let w_step = scaled(&weights_grad, w_acc);
        let b_step = scaled(&biases_grad, b_acc);
        layer.apply_gradients(w_step, b_step, self.learning_rate);
    }
}

/// g / (sqrt(acc) + ε), element-wise.
fn scaled(grad: &Matrix, acc: &Matrix) -> Matrix {
    let data = grad
        .data
        .iter()
        .zip(acc.data.iter())
        .map(|(g_row, a_row)| {
            g_row
                .iter()
                .zip(a_row.iter())
                .map(|(g, a)| g / (a.sqrt() + EPS))
                .collect()
        })
        .collect();
    Matrix::from_data(data)
}
