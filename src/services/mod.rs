// Service exports
pub mod coordinator;
pub mod registry;

pub use coordinator::{EngineError, EventCoordinator, LiveEvent};
pub use registry::{RegistryClient, RegistryError};
