pub mod loss_type;
pub mod mse;
pub mod softmax_ce;
