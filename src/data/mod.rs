pub mod case;
pub mod caseman;
pub mod sources;
