use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Mul, Sub};

/// Dense row-major f64 matrix. Rows are cases when a matrix carries a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data,
        }
    }

    /// Batch matrix from case rows: one row per case.
    pub fn from_rows<'a, I>(rows: I) -> Matrix
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        Matrix::from_data(rows.into_iter().map(|r| r.to_vec()).collect())
    }

    /// Uniform initialization in [low, high).
    ///
    /// A zero-width range (low == high) fills the constant instead of
    /// sampling; `gen_range` would panic on an empty interval.
    pub fn uniform<R: Rng>(rows: usize, cols: usize, low: f64, high: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = if low == high {
                    low
                } else {
                    rng.gen_range(low..high)
                };
            }
        }
        res
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    /// Both u1 and u2 must be uniform on (0, 1].
    fn sample_standard_normal<R: Rng>(rng: &mut R) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Fan-in-scaled initialization: samples from N(0, sqrt(2 / rows)).
    ///
    /// `rows` is the fan-in (number of incoming connections per output
    /// neuron), so the variance of early activations stays level regardless
    /// of layer width.
    pub fn fan_in_scaled<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let std_dev = (2.0 / rows as f64).sqrt();
        let mut res = Matrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);
        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }
        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix::from_data(
            self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        )
    }

    /// Adds a single-row matrix to every row of `self` (bias broadcast).
    pub fn add_rowvec(&self, row: &Matrix) -> Matrix {
        assert_eq!(row.rows, 1, "broadcast operand must be a single row");
        assert_eq!(self.cols, row.cols, "broadcast width mismatch");
        let mut res = self.clone();
        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] += row.data[0][j];
            }
        }
        res
    }

    /// Element-wise (Hadamard) product with a same-shape matrix.
    pub fn hadamard(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(self.rows, rhs.rows);
        assert_eq!(self.cols, rhs.cols);
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(ra, rb)| ra.iter().zip(rb.iter()).map(|(x, y)| x * y).collect())
            .collect();
        Matrix::from_data(data)
    }

    /// Column sums collapsed to a single row (bias gradients).
    pub fn column_sums(&self) -> Matrix {
        let mut res = Matrix::zeros(1, self.cols);
        for row in &self.data {
            for (j, v) in row.iter().enumerate() {
                res.data[0][j] += v;
            }
        }
        res
    }

    pub fn iter_all(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().flat_map(|row| row.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn same_shape(&self, other: &Matrix) -> bool {
        self.rows == other.rows && self.cols == other.cols
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix {
            rows: 0,
            cols: 0,
            data: vec![],
        }
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }
        let mut res = Matrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] + rhs.data[i][j];
            }
        }
        res
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }
        let mut res = Matrix::zeros(self.rows, self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = self.data[i][j] - rhs.data[i][j];
            }
        }
        res
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }
        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }
                res.data[i][j] = sum;
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn uniform_zero_width_range_fills_constant() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = Matrix::uniform(3, 4, 0.0, 0.0, &mut rng);
        assert!(m.iter_all().all(|v| v == 0.0));
    }

    #[test]
    fn uniform_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let m = Matrix::uniform(10, 10, -0.5, 0.5, &mut rng);
        assert!(m.iter_all().all(|v| (-0.5..0.5).contains(&v)));
    }

    #[test]
    fn add_rowvec_broadcasts_over_rows() {
        let x = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        let b = Matrix::from_data(vec![vec![10.0, 20.0]]);
        let y = x.add_rowvec(&b);
        assert_eq!(y.data, vec![vec![11.0, 22.0], vec![13.0, 24.0]]);
    }

    #[test]
    fn column_sums_collapse_batch() {
        let x = Matrix::from_data(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(x.column_sums().data, vec![vec![4.0, 6.0]]);
    }

    #[test]
    fn matmul_shapes_and_values() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0, 3.0]]);
        let b = Matrix::from_data(vec![vec![1.0], vec![0.5], vec![2.0]]);
        let c = a * b;
        assert_eq!((c.rows, c.cols), (1, 1));
        assert_eq!(c.data[0][0], 8.0);
    }
}
