use crate::layers::dense::DenseLayer;
use crate::math::matrix::Matrix;

const DECAY: f64 = 0.9;
const EPS: f64 = 1e-10;

/// RMSProp: exponentially decayed moving average of squared gradients.
#[derive(Debug)]
pub struct RmsProp {
    pub learning_rate: f64,
    accum: Vec<(Matrix, Matrix)>,
}

impl RmsProp {
    pub fn new(learning_rate: f64) -> RmsProp {
        RmsProp {
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

        *w_acc = decayed(w_acc, &weights_grad);
        *b_acc = decayed(b_acc, &biases_grad);

        let w_step = scaled(&weights_grad, w_acc);
        let b_step = scaled(&biases_grad, b_acc);
        layer.apply_gradients(w_step, b_step, self.learning_rate);
    }
}

/// acc = decay·acc + (1 - decay)·g², element-wise.
fn decayed(acc: &Matrix, grad: &Matrix) -> Matrix {
    let data = acc
        .data
        .iter()
        .zip(grad.data.iter())
        .map(|(a_row, g_row)| {
            a_row
                .iter()
                .zip(g_row.iter())
                .map(|(a, g)| DECAY * a + (1.0 - DECAY) * g * g)
                .collect()
        })
        .collect();
    Matrix::from_data(data)
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
