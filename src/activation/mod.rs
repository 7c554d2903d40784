pub mod activation;
pub mod output;
