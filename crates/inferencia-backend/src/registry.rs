use std::sync::Arc;

use indexmap::IndexMap;

use crate::{Backend, BackendError};

/// Named adapters plus the primary designation
///
/// Populated at startup and then shared read-only behind an `Arc`.
/// Enumeration follows registration order.
#[derive(Default)]
pub struct Registry {
    backends: IndexMap<String, Arc<dyn Backend>>,
    primary: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter under its own name
    ///
    /// Registering a name again replaces the adapter in place. The first
    /// name ever registered becomes the primary.
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        let name = backend.name().to_string();
        if self.primary.is_none() {
            self.primary = Some(name.clone());
        }
        if self.backends.insert(name.clone(), backend).is_some() {
            tracing::debug!(backend = %name, "replaced registered backend");
        }
    }

    /// Make an already registered backend the primary
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if `name` is not registered
    pub fn set_primary(&mut self, name: &str) -> Result<(), BackendError> {
        if !self.backends.contains_key(name) {
            return Err(BackendError::NotFound { name: name.to_string() });
        }
        self.primary = Some(name.to_string());
        Ok(())
    }

    /// Look up a backend by name; the empty name resolves to the primary
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] for an unknown name and
    /// [`BackendError::NoBackends`] when resolving the primary of an empty
    /// registry
    pub fn get(&self, name: &str) -> Result<Arc<dyn Backend>, BackendError> {
        let name = if name.is_empty() {
            self.primary.as_deref().ok_or(BackendError::NoBackends)?
        } else {
            name
        };

        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::NotFound { name: name.to_string() })
    }

    /// The primary backend
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NoBackends`] if nothing was ever registered
    pub fn primary(&self) -> Result<Arc<dyn Backend>, BackendError> {
        self.get("")
    }

    /// Every registered backend, for aggregate health reporting
    pub fn all(&self) -> Vec<Arc<dyn Backend>> {
        self.backends.values().cloned().collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .field("primary", &self.primary)
            .finish()
    }
}
