pub mod activation;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod state;
pub mod train;

// Convenience re-exports
pub use activation::activation::ActivationFunction;
pub use activation::output::OutputFunction;
pub use data::case::Case;
pub use data::caseman::CaseManager;
pub use error::{Error, Result};
pub use layers::dense::{DenseLayer, WeightInit};
pub use loss::loss_type::LossType;
pub use math::matrix::Matrix;
pub use network::network::Network;
pub use optim::optimizer::{Optimizer, OptimizerKind};
pub use state::store::Store;
pub use train::controller::{Controller, ControllerConfig, Phase, RunReport};
pub use train::monitor::{Monitor, TensorKind};
