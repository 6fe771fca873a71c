//! Error types for origin and registry operations

use thiserror::Error;

/// Origin, registry and artifact store errors
#[derive(Debug, Error)]
pub enum IndexError {
    // ============ Configuration Errors ============
    #[error("Origin URI is empty for distributions: {distributions}")]
    EmptyOriginUri { distributions: String },

    #[error("Distribution {name} is declared by more than one origin ({first} and {second})")]
    DuplicateDistribution {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid origin configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Lookup Errors ============
    #[error("Distribution not registered: {name}")]
    DistributionNotFound { name: String },

    #[error("Repository not found: {name}")]
    RepositoryNotFound { name: String },

    #[error("Release {selector} not found in {repo}")]
    ReleaseNotFound { selector: String, repo: String },

    // ============ Upstream Errors ============
    #[error("Upstream error: {status} from {url}")]
    UpstreamStatus { status: u16, url: String },

    #[error("Upstream unavailable: {message}")]
    Upstream { message: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("No access token configured for origin {origin}")]
    MissingToken { origin: String },

    // ============ Build Errors ============
    #[error("Build failed in {source_dir} (exit status {status}):\n{output}")]
    BuildFailed {
        source_dir: String,
        status: i32,
        output: String,
    },

    // ============ Capability Errors ============
    #[error("{operation} is not supported by {backend} origins")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for origin operations
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// Whether this error means "the origin kind cannot do this", as
    /// opposed to a genuine failure. Callers branch on capability
    /// instead of treating it as a fault.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, IndexError::Unsupported { .. })
    }
}

impl From<reqwest::Error> for IndexError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            IndexError::Upstream {
                message: format!("Request timed out: {}", e),
            }
        } else if e.is_connect() {
            IndexError::Upstream {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            IndexError::UpstreamStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else {
            IndexError::Upstream {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for IndexError {
    fn from(e: serde_yaml::Error) -> Self {
        IndexError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(e: serde_json::Error) -> Self {
        IndexError::Serialization(e.to_string())
    }
}
