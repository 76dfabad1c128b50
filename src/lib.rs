pub mod config;
pub mod error;
pub mod forecast;
pub mod input;
pub mod model;
pub mod runtime;
pub mod signal;
pub mod simulation;
pub mod stats;
pub mod stochastic;

pub use error::{ForecastError, Result};
pub use runtime::{ModelDescriptor, ModelHandle, ModelRegistry};
pub use stochastic::ModelKind;
