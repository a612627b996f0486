//! Application state for the web layer.

use std::sync::Arc;

use crate::registry::StopRegistry;

/// Shared application state.
pub struct AppState<S> {
    /// Configured stops
    pub registry: Arc<StopRegistry<S>>,
}

impl<S> AppState<S> {
    /// Create a new app state.
    pub fn new(registry: Arc<StopRegistry<S>>) -> Self {
        Self { registry }
    }
}

// Derived Clone would require `S: Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}
