//! Distribution registry
//!
//! Built once at startup from the origin declarations and read-only
//! afterwards; concurrent lookups need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use wheelhouse_core::normalize_name;

use crate::backend::{Backend, create_backend};
use crate::config::OriginDeclaration;
use crate::error::{IndexError, Result};

/// Read-only map from normalized distribution name to origin backend
pub struct Registry {
    entries: HashMap<String, Arc<dyn Backend>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// Look up the backend serving a distribution. The name is
    /// normalized before lookup, so `Foo_Bar` and `foo-bar` resolve to
    /// the same entry.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.entries.get(&normalize_name(name)).cloned()
    }

    /// All registered distribution names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assemble a registry directly from name → backend pairs. Names
    /// are normalized. Configuration loading goes through
    /// [`build_registry`], which also validates declarations; this is
    /// for embedders and tests that construct backends themselves.
    pub fn from_backends(pairs: impl IntoIterator<Item = (String, Arc<dyn Backend>)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(name, backend)| (normalize_name(&name), backend))
            .collect();
        Self { entries }
    }
}

/// Build the registry from origin declarations.
///
/// One backend instance is created per declaration and shared across
/// every distribution name it lists. Configuration problems (empty
/// URIs, declarations without distributions, a name claimed by two
/// declarations) fail here, at startup, before any traffic is served.
pub fn build_registry(declarations: &[OriginDeclaration]) -> Result<Registry> {
    let mut entries: HashMap<String, Arc<dyn Backend>> = HashMap::new();
    let mut owners: HashMap<String, String> = HashMap::new();

    for declaration in declarations {
        if declaration.uri.trim().is_empty() {
            return Err(IndexError::EmptyOriginUri {
                distributions: declaration.distributions.join(", "),
            });
        }
        if declaration.distributions.is_empty() {
            return Err(IndexError::InvalidConfig {
                message: format!("Origin {} declares no distributions", declaration.uri),
            });
        }

        let backend = create_backend(declaration)?;
        for name in &declaration.distributions {
            let normalized = normalize_name(name);
            if let Some(first) = owners.get(&normalized) {
                // Ambiguous ownership is a configuration error, not a
                // silent overwrite.
                return Err(IndexError::DuplicateDistribution {
                    name: normalized,
                    first: first.clone(),
                    second: declaration.uri.clone(),
                });
            }
            owners.insert(normalized.clone(), declaration.uri.clone());
            entries.insert(normalized, Arc::clone(&backend));
        }
    }

    tracing::info!(distributions = entries.len(), "registry built");
    Ok(Registry { entries })
}
