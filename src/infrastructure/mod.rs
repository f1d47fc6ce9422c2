pub mod backends;
pub mod embedders;
