//! Origin and server configuration
//!
//! Loaded once at startup from `~/.config/wheelhouse/config.yaml` (or an
//! explicit path). The core never mutates configuration after load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Origins, each serving one or more distribution names
    #[serde(default)]
    pub origins: Vec<OriginDeclaration>,
}

impl IndexConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| IndexError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("wheelhouse").join("config.yaml"))
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path prefix the index is mounted under (empty for root)
    #[serde(default)]
    pub base_path: String,

    /// Directory fetched artifacts are cached in
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Directory of HTML template overrides (embedded templates if unset)
    #[serde(default)]
    pub html_dir: Option<PathBuf>,

    /// Log a warning when the root index is served with no origins
    #[serde(default)]
    pub warn_empty_index: bool,
}

fn default_port() -> u16 {
    8080
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            base_path: String::new(),
            artifact_dir: default_artifact_dir(),
            html_dir: None,
            warn_empty_index: false,
        }
    }
}

/// One origin and the distribution names it serves
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginDeclaration {
    /// Origin URI: a GitHub URL or a local source checkout path
    pub uri: String,

    /// Distribution names this origin serves
    #[serde(default)]
    pub distributions: Vec<String>,

    /// Access token for authenticated origins
    #[serde(default)]
    pub access_token: Option<String>,

    /// Environment variable holding the access token (CI/CD friendly;
    /// takes effect when `access_token` is unset)
    #[serde(default)]
    pub access_token_env: Option<String>,

    /// Build command for local origins, argv style
    /// (default: `python -m build --wheel`)
    #[serde(default)]
    pub build_command: Option<Vec<String>>,
}

// Access tokens must not leak into logs or error chains.
impl fmt::Debug for OriginDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginDeclaration")
            .field("uri", &self.uri)
            .field("distributions", &self.distributions)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("access_token_env", &self.access_token_env)
            .field("build_command", &self.build_command)
            .finish()
    }
}

impl OriginDeclaration {
    /// Resolve the access token, preferring the literal value over the
    /// environment indirection.
    pub fn resolve_token(&self) -> Result<Option<String>> {
        if let Some(token) = &self.access_token {
            return Ok(Some(token.clone()));
        }
        if let Some(var) = &self.access_token_env {
            let token = std::env::var(var).map_err(|_| IndexError::MissingToken {
                origin: self.uri.clone(),
            })?;
            return Ok(Some(token));
        }
        Ok(None)
    }

    /// Detect the origin kind from the URI shape.
    pub fn kind(&self) -> OriginKind {
        OriginKind::detect(&self.uri)
    }
}

/// Origin kind, selected by URI shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginKind {
    /// GitHub repository; artifacts are release assets
    Github,

    /// Local source checkout; artifacts are built on demand
    Local,
}

impl OriginKind {
    /// URIs addressing github.com select the GitHub origin; everything
    /// else (filesystem paths, file:// URIs) is treated as local.
    pub fn detect(uri: &str) -> Self {
        if let Ok(parsed) = url::Url::parse(uri) {
            if matches!(parsed.scheme(), "http" | "https")
                && parsed
                    .host_str()
                    .is_some_and(|h| h == "github.com" || h.ends_with(".github.com"))
            {
                return OriginKind::Github;
            }
        }
        OriginKind::Local
    }
}
