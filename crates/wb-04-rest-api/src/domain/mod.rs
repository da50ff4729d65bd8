//! # Domain Layer

pub mod config;
pub mod errors;
pub mod views;

pub use config::{RestConfig, RestConfigError};
pub use errors::{ErrorBody, RestError};
pub use views::*;
