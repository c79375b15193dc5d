//! Dynamic Type Resolver
//!
//! Finds the provider's task type by name. Candidates are tried in order,
//! then every loaded component is scanned for a short-name match, so the
//! lookup survives the provider moving the type to another namespace or
//! shipping it under another component name.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::component::TypeInfo;
use super::registry::ComponentRegistry;

/// Candidates tried when the configuration names none
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "YoloSharp.YoloTask, IntptrMax.YoloSharp",
    "IntptrMax.YoloSharp.YoloTask, IntptrMax.YoloSharp",
];

/// A type name, optionally qualified by the component exporting it.
///
/// Written as `Namespace.Type` or `Namespace.Type, Component`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub type_name: String,
    pub component: Option<String>,
}

impl QualifiedName {
    pub fn parse(s: &str) -> Option<Self> {
        let (type_name, component) = match s.split_once(',') {
            Some((ty, comp)) => (ty.trim(), Some(comp.trim())),
            None => (s.trim(), None),
        };
        if type_name.is_empty() {
            return None;
        }
        Some(Self {
            type_name: type_name.to_string(),
            component: component.filter(|c| !c.is_empty()).map(str::to_string),
        })
    }

    /// Last dotted segment of the type name
    pub fn short_name(&self) -> &str {
        self.type_name
            .rsplit_once('.')
            .map(|(_, short)| short)
            .unwrap_or(&self.type_name)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component {
            Some(component) => write!(f, "{}, {}", self.type_name, component),
            None => write!(f, "{}", self.type_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("type not found; tried {}", .candidates.join("; "))]
pub struct ResolveError {
    pub candidates: Vec<String>,
}

/// Resolves a type from an ordered list of candidate names
#[derive(Debug, Clone)]
pub struct TypeResolver {
    candidates: Vec<QualifiedName>,
}

impl TypeResolver {
    /// Build a resolver; unparsable candidates are dropped with a warning
    pub fn new<S: AsRef<str>>(candidates: &[S]) -> Self {
        let candidates = candidates
            .iter()
            .filter_map(|c| {
                let parsed = QualifiedName::parse(c.as_ref());
                if parsed.is_none() {
                    log::warn!("ignoring malformed type candidate '{}'", c.as_ref());
                }
                parsed
            })
            .collect();
        Self { candidates }
    }

    pub fn candidates(&self) -> &[QualifiedName] {
        &self.candidates
    }

    /// Resolve against the components currently loaded in `registry`
    pub fn resolve(&self, registry: &ComponentRegistry) -> Result<Arc<TypeInfo>, ResolveError> {
        for candidate in &self.candidates {
            let hit = match &candidate.component {
                Some(component) => registry
                    .component(component)
                    .and_then(|c| c.find_type(&candidate.type_name))
                    .cloned(),
                None => registry
                    .types()
                    .find(|t| t.full_name() == candidate.type_name)
                    .cloned(),
            };
            if let Some(ty) = hit {
                log::debug!("resolved {} via candidate '{}'", ty.full_name(), candidate);
                return Ok(ty);
            }
        }

        for candidate in &self.candidates {
            let short = candidate.short_name();
            for component in registry.components() {
                if let Some(ty) = component.types().iter().find(|t| t.short_name() == short) {
                    log::debug!(
                        "resolved {} by scanning component '{}' for '{}'",
                        ty.full_name(),
                        component.name(),
                        short
                    );
                    return Ok(Arc::clone(ty));
                }
            }
        }

        Err(ResolveError {
            candidates: self.candidates.iter().map(|c| c.to_string()).collect(),
        })
    }
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATES)
    }
}
