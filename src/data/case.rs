/// One (input, target) pair. Dimensionality is fixed for a whole dataset;
/// the harness assumes the vectors are already numeric and scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
}

impl Case {
    pub fn new(input: Vec<f64>, target: Vec<f64>) -> Case {
        Case { input, target }
    }
}
