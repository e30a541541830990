pub mod config;
pub mod controller;
pub mod errors;
pub mod image_ops;
pub mod store;
pub mod transport;
pub mod utils;
