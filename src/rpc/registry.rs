//! Service name to Caller mapping.
//!
//! # Design Decisions
//! - One mutex guards both registration and lookup
//! - Entries are never removed or replaced once registered
//! - Owned by the composition root and shared through `Arc`, never global

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::rpc::caller::Caller;
use crate::rpc::error::RegistryError;

#[derive(Default)]
pub struct ServiceRegistry {
    services: Mutex<HashMap<String, Arc<dyn Caller>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `caller` under `name`.
    pub fn register<C>(&self, name: impl Into<String>, caller: C) -> Result<(), RegistryError>
    where
        C: Caller + 'static,
    {
        self.register_arc(name, Arc::new(caller))
    }

    /// Register an already shared Caller.
    pub fn register_arc(
        &self,
        name: impl Into<String>,
        caller: Arc<dyn Caller>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut services = self.lock();
        if services.contains_key(&name) {
            return Err(RegistryError::DuplicateService(name));
        }
        tracing::debug!(service = %name, "Service registered");
        services.insert(name, caller);
        Ok(())
    }

    /// Register `caller` under its own type name (`my_crate::Arith` → `Arith`).
    pub fn register_typed<C>(&self, caller: C) -> Result<(), RegistryError>
    where
        C: Caller + 'static,
    {
        self.register(type_short_name::<C>(), caller)
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Caller>, RegistryError> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ServiceNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registered names, sorted.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    // Inserts are atomic under the lock, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<dyn Caller>>> {
        self.services.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.service_names())
            .finish()
    }
}

/// Last path segment of a type name, generics stripped.
fn type_short_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
