pub mod model_registry;

pub use model_registry::{ModelDescriptor, ModelHandle, ModelRegistry};
