use crate::layers::dense::DenseLayer;
use crate::math::matrix::Matrix;

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPS: f64 = 1e-8;

/// Adam: bias-corrected first and second moment estimates per parameter.
#[derive(Debug)]
pub struct Adam {
    pub learning_rate: f64,
    moments: Vec<LayerMoments>,
}

#[derive(Debug)]
struct LayerMoments {
    t: u32,
    w_m: Matrix,
    w_v: Matrix,
    b_m: Matrix,
    b_v: Matrix,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            moments: Vec::new(),
        }
    }

    /// One Adam update for one layer.
    ///
    /// Each layer carries its own timestep, so the update is correct no
    /// matter what order the layers step in within a training step.
    pub fn step(
        &mut self,
        layer_index: usize,
        layer: &mut DenseLayer,
        weights_grad: Matrix,
        biases_grad: Matrix,
    ) {
        while self.moments.len() <= layer_index {
            self.moments.push(LayerMoments {
                t: 0,
                w_m: Matrix::default(),
                w_v: Matrix::default(),
                b_m: Matrix::default(),
                b_v: Matrix::default(),
            });
        }
        let slot = &mut self.moments[layer_index];
        if !slot.w_m.same_shape(&weights_grad) {
            slot.t = 0;
            slot.w_m = Matrix::zeros(weights_grad.rows, weights_grad.cols);
            slot.w_v = Matrix::zeros(weights_grad.rows, weights_grad.cols);
            slot.b_m = Matrix::zeros(biases_grad.rows, biases_grad.cols);
            slot.b_v = Matrix::zeros(biases_grad.rows, biases_grad.cols);
        }

        slot.t += 1;
        let t = slot.t;
        let w_step = moment_step(&mut slot.w_m, &mut slot.w_v, &weights_grad, t);
        let b_step = moment_step(&mut slot.b_m, &mut slot.b_v, &biases_grad, t);
        layer.apply_gradients(w_step, b_step, self.learning_rate);
    }
}

/// Updates both moments in place and returns m̂ / (√v̂ + ε).
fn moment_step(m: &mut Matrix, v: &mut Matrix, grad: &Matrix, t: u32) -> Matrix {
    let mc = 1.0 - BETA1.powi(t as i32);
    let vc = 1.0 - BETA2.powi(t as i32);
    let mut step = Matrix::zeros(grad.rows, grad.cols);
    for i in 0..grad.rows {
        for j in 0..grad.cols {
            let g = grad.data[i][j];
            m.data[i][j] = BETA1 * m.data[i][j] + (1.0 - BETA1) * g;
            v.data[i][j] = BETA2 * v.data[i][j] + (1.0 - BETA2) * g * g;
            let m_hat = m.data[i][j] / mc;
            let v_hat = v.data[i][j] / vc;
            step.data[i][j] = m_hat / (v_hat.sqrt() + EPS);
        }
    }
    step
}
