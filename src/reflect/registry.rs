//! Component Registry
//!
//! The set of components currently loaded into the process, whether they
//! came from a provider library or were registered in-process.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use super::component::{Component, TypeInfo};
use super::loader::{ComponentLibrary, ComponentLoader, LoadError};
use crate::config;

/// Central registry of loaded components
pub struct ComponentRegistry {
    /// Library loader
    loader: ComponentLoader,
    /// Components in load order
    components: Vec<Arc<Component>>,
    /// Provider libraries backing some of the components
    libraries: Vec<ComponentLibrary>,
}

impl ComponentRegistry {
    /// Create an empty registry searching the default locations
    pub fn new() -> Self {
        Self::with_loader(ComponentLoader::new())
    }

    /// Create an empty registry with a custom loader
    pub fn with_loader(loader: ComponentLoader) -> Self {
        Self {
            loader,
            components: Vec::new(),
            libraries: Vec::new(),
        }
    }

    /// Register an in-process component.
    ///
    /// A component with the same name replaces the earlier registration.
    pub fn register(&mut self, component: Component) -> Arc<Component> {
        let component = Arc::new(component);
        if let Some(slot) = self
            .components
            .iter_mut()
            .find(|c| c.name() == component.name())
        {
            log::warn!("replacing component '{}'", component.name());
            *slot = Arc::clone(&component);
        } else {
            log::debug!("registered component '{}'", component.name());
            self.components.push(Arc::clone(&component));
        }
        component
    }

    /// Remove a component by name, returning whether it was present.
    ///
    /// Libraries backing the component stay resident.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.components.len();
        self.components.retain(|c| c.name() != name);
        self.components.len() != before
    }

    /// Load a provider library by name or path and register its component
    pub fn load_library(&mut self, name: &str) -> Result<Arc<Component>, LoadError> {
        let path = self
            .loader
            .find_library(name)
            .ok_or_else(|| LoadError::NotFound(name.to_string()))?;

        if let Some(existing) = self.libraries.iter().find(|lib| lib.path() == path.as_path()) {
            let component = existing.component().clone();
            return Ok(self.register(component));
        }

        let library = ComponentLibrary::load(&path)?;
        let component = library.component().clone();
        self.libraries.push(library);
        Ok(self.register(component))
    }

    /// Get a component by name
    pub fn component(&self, name: &str) -> Option<&Arc<Component>> {
        self.components.iter().find(|c| c.name() == name)
    }

    /// All components in load order
    pub fn components(&self) -> impl Iterator<Item = &Arc<Component>> {
        self.components.iter()
    }

    /// Every exported type across all components, in load order
    pub fn types(&self) -> impl Iterator<Item = &Arc<TypeInfo>> {
        self.components.iter().flat_map(|c| c.types().iter())
    }

    /// List loaded component names
    pub fn component_names(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Process-wide registry consulted by the C-ABI surface
    static ref GLOBAL: RwLock<ComponentRegistry> = RwLock::new(bootstrap());
}

/// Build the global registry from the bridge configuration, loading every
/// configured provider library. Failures are logged and skipped.
fn bootstrap() -> ComponentRegistry {
    let cfg = config::get();
    let mut loader = ComponentLoader::new();
    for path in cfg.plugin_search_paths() {
        loader.add_search_path(path);
    }

    let mut registry = ComponentRegistry::with_loader(loader);
    for name in &cfg.plugins.libraries {
        if let Err(e) = registry.load_library(name) {
            log::warn!("skipping configured component library '{}': {}", name, e);
        }
    }
    registry
}

/// The process-wide registry
pub fn global() -> &'static RwLock<ComponentRegistry> {
    &GLOBAL
}

/// Register an in-process component with the process-wide registry
pub fn register_component(component: Component) -> Arc<Component> {
    GLOBAL.write().register(component)
}

/// Remove a component from the process-wide registry
pub fn unregister_component(name: &str) -> bool {
    GLOBAL.write().unregister(name)
}
