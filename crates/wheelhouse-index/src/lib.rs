//! Wheelhouse Index - Origin backends and the distribution registry
//!
//! This crate provides everything between the HTTP surface and the
//! artifact origins:
//!
//! - **GitHub origins**: distributions whose wheels are release assets
//! - **Local origins**: distributions built from a source checkout
//! - **Registry**: startup-built, read-only name → backend map
//! - **Artifact store**: on-disk cache with per-key fetch locks
//!
//! ## Example
//!
//! ```rust,no_run
//! use wheelhouse_index::{OriginDeclaration, build_registry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_registry(&[OriginDeclaration {
//!     uri: "https://github.com/myorg".to_string(),
//!     distributions: vec!["repo1".to_string(), "repo2".to_string()],
//!     access_token: None,
//!     access_token_env: Some("GITHUB_TOKEN".to_string()),
//!     build_command: None,
//! }])?;
//!
//! let backend = registry.get("repo1").expect("registered");
//! let repo = backend.get_repository("repo1").await?;
//! let artifacts = backend.list_artifacts(&repo).await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod github;
pub mod local;
pub mod registry;
pub mod remote;
pub mod store;

// Re-exports for convenience
pub use backend::{
    ArtifactRecord, AssetLocator, Backend, BackendKind, ReleaseSelector, RepoHandle,
    create_backend,
};
pub use config::{IndexConfig, OriginDeclaration, OriginKind, ServerConfig};
pub use error::{IndexError, Result};
pub use github::GithubClient;
pub use local::LocalBackend;
pub use registry::{Registry, build_registry};
pub use remote::GithubBackend;
pub use store::ArtifactStore;
