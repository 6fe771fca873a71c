//! Shared application state

use std::sync::Arc;

use minijinja::Environment;
use wheelhouse_index::{ArtifactStore, Registry, ServerConfig};

use crate::error::AppError;
use crate::render;

/// State shared by every request handler.
///
/// Everything in here is read-only after startup except the artifact
/// store, which synchronizes itself.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub store: Arc<ArtifactStore>,
    pub config: Arc<ServerConfig>,
    pub templates: Arc<Environment<'static>>,
}

impl AppState {
    pub fn new(registry: Registry, config: ServerConfig) -> Result<Self, AppError> {
        let templates = render::environment(config.html_dir.as_deref())
            .map_err(|e| AppError::Internal(format!("template setup failed: {e}")))?;
        let store = ArtifactStore::new(config.artifact_dir.clone());

        Ok(Self {
            registry: Arc::new(registry),
            store: Arc::new(store),
            config: Arc::new(config),
            templates: Arc::new(templates),
        })
    }
}
