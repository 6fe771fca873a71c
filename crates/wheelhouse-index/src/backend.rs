//! Unified origin backend trait
//!
//! Provides a single interface for both origin kinds (GitHub releases,
//! local builds). Backends are long-lived, hold no per-request state,
//! and are shared behind `Arc` across every distribution name their
//! declaration serves.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{OriginDeclaration, OriginKind};
use crate::error::Result;
use crate::local::LocalBackend;
use crate::remote::GithubBackend;

/// Origin backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Artifacts are GitHub release assets
    GithubRelease,
    /// Artifacts are built from a local source checkout
    LocalBuild,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::GithubRelease => "github-release",
            BackendKind::LocalBuild => "local-build",
        }
    }
}

/// Resolved repository handle
///
/// For GitHub origins `full_name` is the `owner/repo` pair the origin
/// resolved the distribution to. Local origins do not resolve handles
/// themselves; callers substitute [`RepoHandle::synthetic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    /// Distribution name the handle was resolved for
    pub distribution: String,
    /// Backend-specific repository locator
    pub full_name: String,
}

impl RepoHandle {
    /// Handle for origin kinds that cannot resolve repositories
    /// themselves (local builds).
    pub fn synthetic(distribution: &str) -> Self {
        Self {
            distribution: distribution.to_string(),
            full_name: distribution.to_string(),
        }
    }
}

/// Opaque token a backend uses to refetch an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocator {
    /// GitHub asset, refetched through the authenticated API URL
    Remote { asset_id: u64, url: String },
    /// File already on local disk (build output or cache fast path)
    File { path: PathBuf },
}

/// One known artifact
///
/// `local_path` is set only after a successful fetch to the cache;
/// `None` means "exists upstream, not cached yet".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub name: String,
    pub locator: AssetLocator,
    pub local_path: Option<PathBuf>,
}

/// Release to resolve an artifact from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseSelector {
    /// Most recent release carrying the requested artifact
    Latest,
    /// Release identified by tag (tried verbatim, then `v`-prefixed)
    Tag(String),
}

impl std::fmt::Display for ReleaseSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReleaseSelector::Latest => write!(f, "latest"),
            ReleaseSelector::Tag(tag) => write!(f, "{tag}"),
        }
    }
}

/// Unified origin backend trait
#[async_trait]
pub trait Backend: Send + Sync {
    /// Backend kind
    fn kind(&self) -> BackendKind;

    /// Origin URI this backend is bound to
    fn origin_uri(&self) -> &str;

    /// Resolve a distribution name to a repository handle.
    ///
    /// Returns `IndexError::Unsupported` for origin kinds that have no
    /// repository notion; callers substitute a synthetic handle.
    async fn get_repository(&self, distribution: &str) -> Result<RepoHandle>;

    /// Enumerate every artifact across every release (or build output)
    /// of the repository. Order is stable within a single call.
    async fn list_artifacts(&self, repo: &RepoHandle) -> Result<Vec<ArtifactRecord>>;

    /// Resolve `selector` to a release, locate `filename` within it and
    /// ensure a local copy exists under `cache_dir`.
    ///
    /// Returns `Ok(None)` when the resolved release has no artifact with
    /// that exact filename. An existing non-empty file at the
    /// destination short-circuits the fetch unless `overwrite` is set.
    async fn fetch_artifact(
        &self,
        repo: &RepoHandle,
        selector: &ReleaseSelector,
        filename: &str,
        cache_dir: &Path,
        overwrite: bool,
    ) -> Result<Option<ArtifactRecord>>;
}

/// Create a backend for an origin declaration, selecting the
/// implementation by URI shape.
pub fn create_backend(declaration: &OriginDeclaration) -> Result<Arc<dyn Backend>> {
    match declaration.kind() {
        OriginKind::Github => Ok(Arc::new(GithubBackend::new(declaration.clone())?)),
        OriginKind::Local => Ok(Arc::new(LocalBackend::new(declaration.clone()))),
    }
}

/// Requested asset names may arrive with a path prefix; only the final
/// component identifies the artifact.
pub(crate) fn base_filename(filename: &str) -> &str {
    filename.rsplit('/').next().unwrap_or(filename)
}

/// Treat an existing non-empty file as a complete cached artifact.
pub(crate) fn is_cached(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}
