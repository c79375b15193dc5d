//! Component Library Loader
//!
//! Safe-ish wrapper around libloading for provider libraries. A provider
//! exports `yt_component_entry` (see [`declare_component!`](crate::declare_component))
//! which hands back its [`Component`].

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use thiserror::Error;

use super::component::{panic_message, Component};

/// Symbol every provider library must export
pub const COMPONENT_ENTRY_SYMBOL: &str = "yt_component_entry";

type ComponentEntry = fn() -> Component;

/// Error type for provider library loading
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("component library '{0}' not found in any search path")]
    NotFound(String),

    #[error("failed to load library '{path}': {message}")]
    Open { path: PathBuf, message: String },

    #[error("symbol '{symbol}' not found in '{path}': {message}")]
    MissingEntry {
        path: PathBuf,
        symbol: &'static str,
        message: String,
    },

    #[error("component entry of '{path}' panicked: {message}")]
    EntryPanicked { path: PathBuf, message: String },
}

/// A provider library kept resident for the life of the process.
///
/// Types and method closures handed out by the component point into the
/// library's code, so the handle is never closed.
pub struct ComponentLibrary {
    path: PathBuf,
    component: Component,
    _library: Library,
}

impl ComponentLibrary {
    /// Load a provider library from the given path and read its component
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();

        // Safety: loading runs the library's initialisers. The path comes
        // from the caller or the bridge configuration and is trusted.
        let library = unsafe {
            Library::new(&path).map_err(|e| LoadError::Open {
                path: path.clone(),
                message: e.to_string(),
            })?
        };

        // Safety: the entry symbol is generated by `declare_component!`, so
        // its type is `fn() -> Component` when the provider was built
        // against this crate with the same toolchain.
        let entry: ComponentEntry = unsafe {
            let symbol: Symbol<ComponentEntry> = library
                .get(COMPONENT_ENTRY_SYMBOL.as_bytes())
                .map_err(|e| LoadError::MissingEntry {
                    path: path.clone(),
                    symbol: COMPONENT_ENTRY_SYMBOL,
                    message: e.to_string(),
                })?;
            *symbol
        };

        let component =
            panic::catch_unwind(AssertUnwindSafe(entry)).map_err(|payload| {
                LoadError::EntryPanicked {
                    path: path.clone(),
                    message: panic_message(payload.as_ref()),
                }
            })?;

        log::info!(
            "loaded component '{}' ({} types) from {}",
            component.name(),
            component.types().len(),
            path.display()
        );

        Ok(Self {
            path,
            component,
            _library: library,
        })
    }

    /// Get the path to this library
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn component(&self) -> &Component {
        &self.component
    }
}

/// Finds provider libraries on a list of search paths
#[derive(Debug, Clone)]
pub struct ComponentLoader {
    search_paths: Vec<PathBuf>,
}

impl ComponentLoader {
    /// Create a loader searching the default locations
    pub fn new() -> Self {
        Self {
            search_paths: default_search_paths(),
        }
    }

    /// Create a loader with no default locations
    pub fn with_search_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
        }
    }

    /// Add a search path
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find a library by name or path
    pub fn find_library(&self, name: &str) -> Option<PathBuf> {
        // If it's already a path, check if it exists
        let path = Path::new(name);
        if path.exists() {
            return Some(path.to_path_buf());
        }

        let file_name = library_filename(name);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.exists())
    }

    /// Locate and load a provider library
    pub fn load(&self, name: &str) -> Result<ComponentLibrary, LoadError> {
        let path = self
            .find_library(name)
            .ok_or_else(|| LoadError::NotFound(name.to_string()))?;
        log::debug!("loading component library {}", path.display());
        ComponentLibrary::load(path)
    }
}

impl Default for ComponentLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Default provider search paths: next to the bridge, then the working directory
fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir);
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !paths.contains(&cwd) {
            paths.push(cwd);
        }
    }

    paths
}

/// Construct the platform-specific library filename
fn library_filename(name: &str) -> String {
    #[cfg(target_os = "linux")]
    {
        if name.starts_with("lib") && name.ends_with(".so") {
            name.to_string()
        } else {
            format!("lib{}.so", name)
        }
    }

    #[cfg(target_os = "macos")]
    {
        if name.starts_with("lib") && name.ends_with(".dylib") {
            name.to_string()
        } else {
            format!("lib{}.dylib", name)
        }
    }

    #[cfg(target_os = "windows")]
    {
        if name.ends_with(".dll") {
            name.to_string()
        } else {
            format!("{}.dll", name)
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        name.to_string()
    }
}
