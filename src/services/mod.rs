//! Built-in services exposed by the server binary.

pub mod arith;
pub mod echo;

pub use arith::Arith;

use crate::rpc::{RegistryError, ServiceRegistry};

/// Register every built-in service.
pub fn register_builtin(registry: &ServiceRegistry) -> Result<(), RegistryError> {
    registry.register_typed(Arith)?;
    registry.register("Echo", echo::service())?;
    Ok(())
}
