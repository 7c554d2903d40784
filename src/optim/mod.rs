pub mod adagrad;
pub mod adam;
pub mod optimizer;
pub mod rmsprop;
pub mod sgd;
