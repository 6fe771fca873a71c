//! GitHub release origin
//!
//! Serves artifacts that live as release assets on github.com. The
//! authenticated API client is created once, lazily, and reused across
//! every request against the origin.

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::path::Path;

use crate::backend::{
    ArtifactRecord, AssetLocator, Backend, BackendKind, ReleaseSelector, RepoHandle, base_filename,
    is_cached,
};
use crate::config::OriginDeclaration;
use crate::error::{IndexError, Result};
use crate::github::{GithubClient, Release};

const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Backend for a GitHub origin
pub struct GithubBackend {
    declaration: OriginDeclaration,
    api_base: String,
    /// Repository owner, taken from the origin URI path
    owner: String,
    /// Explicit repository name, present when the URI addresses a single
    /// repository rather than an owner
    explicit_repo: Option<String>,
    client: OnceCell<GithubClient>,
}

impl GithubBackend {
    pub fn new(declaration: OriginDeclaration) -> Result<Self> {
        Self::with_api_base(declaration, DEFAULT_API_BASE)
    }

    /// Construct against a custom API base URL (used by tests).
    pub fn with_api_base(
        declaration: OriginDeclaration,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        let parsed = url::Url::parse(&declaration.uri).map_err(|e| IndexError::InvalidConfig {
            message: format!("Invalid GitHub origin URI {}: {}", declaration.uri, e),
        })?;
        let mut segments = parsed
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()))
            .into_iter()
            .flatten();

        let owner = segments
            .next()
            .map(str::to_string)
            .ok_or_else(|| IndexError::InvalidConfig {
                message: format!(
                    "GitHub origin URI {} does not name an owner",
                    declaration.uri
                ),
            })?;
        let explicit_repo = segments.next().map(str::to_string);

        Ok(Self {
            declaration,
            api_base: api_base.into(),
            owner,
            explicit_repo,
            client: OnceCell::new(),
        })
    }

    /// The shared API client, created on first use.
    fn client(&self) -> Result<&GithubClient> {
        self.client.get_or_try_init(|| {
            let token = self.declaration.resolve_token()?;
            GithubClient::with_api_base(&self.api_base, token)
        })
    }

    /// `owner/repo` pair for a distribution name. A URI that already
    /// names a repository and declares a single distribution is used
    /// as-is; otherwise the distribution name supplies the repository.
    fn full_name_for(&self, distribution: &str) -> String {
        match &self.explicit_repo {
            Some(repo) if self.declaration.distributions.len() <= 1 => {
                format!("{}/{}", self.owner, repo)
            }
            _ => format!("{}/{}", self.owner, distribution),
        }
    }

    async fn resolve_release(
        &self,
        repo: &RepoHandle,
        selector: &ReleaseSelector,
        filename: &str,
    ) -> Result<Release> {
        let client = self.client()?;

        if let ReleaseSelector::Tag(tag) = selector {
            if let Some(release) = client.get_release_by_tag(&repo.full_name, tag).await? {
                return Ok(release);
            }
            // Common convention: version 1.2.3 is tagged v1.2.3.
            if !tag.starts_with('v') {
                let prefixed = format!("v{tag}");
                if let Some(release) =
                    client.get_release_by_tag(&repo.full_name, &prefixed).await?
                {
                    return Ok(release);
                }
            }
        }

        // No tag matched; fall back to the most recent release that
        // actually carries the requested asset.
        let releases = client.list_releases(&repo.full_name).await?;
        releases
            .into_iter()
            .find(|r| r.assets.iter().any(|a| a.name == filename))
            .ok_or_else(|| IndexError::ReleaseNotFound {
                selector: selector.to_string(),
                repo: repo.full_name.clone(),
            })
    }
}

#[async_trait]
impl Backend for GithubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GithubRelease
    }

    fn origin_uri(&self) -> &str {
        &self.declaration.uri
    }

    async fn get_repository(&self, distribution: &str) -> Result<RepoHandle> {
        let full_name = self.full_name_for(distribution);
        let repo = self.client()?.get_repo(&full_name).await?;
        Ok(RepoHandle {
            distribution: distribution.to_string(),
            full_name: repo.full_name,
        })
    }

    async fn list_artifacts(&self, repo: &RepoHandle) -> Result<Vec<ArtifactRecord>> {
        let releases = self.client()?.list_releases(&repo.full_name).await?;

        let mut records = Vec::new();
        for release in &releases {
            for asset in &release.assets {
                records.push(ArtifactRecord {
                    name: asset.name.clone(),
                    locator: AssetLocator::Remote {
                        asset_id: asset.id,
                        url: asset.url.clone(),
                    },
                    local_path: None,
                });
            }
        }
        Ok(records)
    }

    async fn fetch_artifact(
        &self,
        repo: &RepoHandle,
        selector: &ReleaseSelector,
        filename: &str,
        cache_dir: &Path,
        overwrite: bool,
    ) -> Result<Option<ArtifactRecord>> {
        let filename = base_filename(filename);
        let dest = cache_dir.join(filename);

        // Idempotent fast path: an existing non-empty file is complete.
        if !overwrite && is_cached(&dest) {
            tracing::debug!(path = %dest.display(), "artifact already cached, skipping fetch");
            return Ok(Some(ArtifactRecord {
                name: filename.to_string(),
                locator: AssetLocator::File { path: dest.clone() },
                local_path: Some(dest),
            }));
        }

        let release = self.resolve_release(repo, selector, filename).await?;
        let Some(asset) = release.assets.iter().find(|a| a.name == filename) else {
            return Ok(None);
        };

        self.client()?.download_asset(asset, &dest).await?;
        tracing::info!(
            repo = %repo.full_name,
            release = %release.tag_name,
            asset = %asset.name,
            "fetched release asset"
        );

        Ok(Some(ArtifactRecord {
            name: asset.name.clone(),
            locator: AssetLocator::Remote {
                asset_id: asset.id,
                url: asset.url.clone(),
            },
            local_path: Some(dest),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn declaration(uri: &str, distributions: &[&str]) -> OriginDeclaration {
        OriginDeclaration {
            uri: uri.to_string(),
            distributions: distributions.iter().map(|s| s.to_string()).collect(),
            access_token: None,
            access_token_env: None,
            build_command: None,
        }
    }

    fn release_body(tag: &str, asset_names: &[&str], server_uri: &str) -> serde_json::Value {
        let assets: Vec<_> = asset_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                serde_json::json!({
                    "id": i + 1,
                    "name": name,
                    "url": format!("{}/assets/{}", server_uri, i + 1),
                    "size": 10,
                })
            })
            .collect();
        serde_json::json!({
            "id": 1,
            "tag_name": tag,
            "draft": false,
            "prerelease": false,
            "assets": assets,
        })
    }

    #[test]
    fn test_full_name_owner_uri() {
        let backend =
            GithubBackend::new(declaration("https://github.com/myorg", &["repo1", "repo2"]))
                .unwrap();
        assert_eq!(backend.full_name_for("repo1"), "myorg/repo1");
        assert_eq!(backend.full_name_for("repo2"), "myorg/repo2");
    }

    #[test]
    fn test_full_name_repo_uri_multiple_distributions() {
        // With several distributions the URI's repo segment cannot be
        // authoritative; each name maps to its own repository.
        let backend = GithubBackend::new(declaration(
            "https://github.com/myorg/repo-a",
            &["repo1", "repo2"],
        ))
        .unwrap();
        assert_eq!(backend.full_name_for("repo1"), "myorg/repo1");
    }

    #[test]
    fn test_full_name_repo_uri_single_distribution() {
        let backend = GithubBackend::new(declaration(
            "https://github.com/myorg/actual-repo",
            &["published-name"],
        ))
        .unwrap();
        assert_eq!(backend.full_name_for("published-name"), "myorg/actual-repo");
    }

    #[test]
    fn test_rejects_uri_without_owner() {
        assert!(GithubBackend::new(declaration("https://github.com/", &["x"])).is_err());
    }

    #[tokio::test]
    async fn test_list_artifacts_spans_releases() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/myorg/repo1/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                release_body("v2.0.0", &["pkg-2.0.0-py3-none-any.whl"], &server.uri()),
                release_body("v1.0.0", &["pkg-1.0.0-py3-none-any.whl"], &server.uri()),
            ])))
            .mount(&server)
            .await;

        let backend = GithubBackend::with_api_base(
            declaration("https://github.com/myorg", &["repo1"]),
            server.uri(),
        )
        .unwrap();

        let repo = RepoHandle {
            distribution: "repo1".to_string(),
            full_name: "myorg/repo1".to_string(),
        };
        let artifacts = backend.list_artifacts(&repo).await.unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].name, "pkg-2.0.0-py3-none-any.whl");
        assert!(artifacts.iter().all(|a| a.local_path.is_none()));
    }

    #[tokio::test]
    async fn test_fetch_artifact_downloads_and_caches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/myorg/repo1/releases/tags/1.0.0"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/myorg/repo1/releases/tags/v1.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release_body(
                "v1.0.0",
                &["pkg-1.0.0-py3-none-any.whl"],
                &server.uri(),
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/assets/1"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"wheel-data".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let backend = GithubBackend::with_api_base(
            declaration("https://github.com/myorg", &["repo1"]),
            server.uri(),
        )
        .unwrap();
        let repo = RepoHandle {
            distribution: "repo1".to_string(),
            full_name: "myorg/repo1".to_string(),
        };
        let cache = tempfile::tempdir().unwrap();

        let record = backend
            .fetch_artifact(
                &repo,
                &ReleaseSelector::Tag("1.0.0".to_string()),
                "pkg-1.0.0-py3-none-any.whl",
                cache.path(),
                false,
            )
            .await
            .unwrap()
            .expect("artifact should resolve");

        let local = record.local_path.unwrap();
        assert_eq!(std::fs::read(&local).unwrap(), b"wheel-data");

        // Second fetch is served from disk; the asset mock allows only
        // one download.
        let again = backend
            .fetch_artifact(
                &repo,
                &ReleaseSelector::Tag("1.0.0".to_string()),
                "pkg-1.0.0-py3-none-any.whl",
                cache.path(),
                false,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.local_path.unwrap(), local);
    }

    #[tokio::test]
    async fn test_fetch_artifact_missing_asset_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/myorg/repo1/releases/tags/1.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(release_body(
                "1.0.0",
                &["other-1.0.0-py3-none-any.whl"],
                &server.uri(),
            )))
            .mount(&server)
            .await;

        let backend = GithubBackend::with_api_base(
            declaration("https://github.com/myorg", &["repo1"]),
            server.uri(),
        )
        .unwrap();
        let repo = RepoHandle {
            distribution: "repo1".to_string(),
            full_name: "myorg/repo1".to_string(),
        };
        let cache = tempfile::tempdir().unwrap();

        let record = backend
            .fetch_artifact(
                &repo,
                &ReleaseSelector::Tag("1.0.0".to_string()),
                "pkg-1.0.0-py3-none-any.whl",
                cache.path(),
                false,
            )
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_fetch_artifact_unresolvable_release() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/myorg/repo1/releases/tags/9.9.9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/myorg/repo1/releases/tags/v9.9.9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/myorg/repo1/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let backend = GithubBackend::with_api_base(
            declaration("https://github.com/myorg", &["repo1"]),
            server.uri(),
        )
        .unwrap();
        let repo = RepoHandle {
            distribution: "repo1".to_string(),
            full_name: "myorg/repo1".to_string(),
        };
        let cache = tempfile::tempdir().unwrap();

        let err = backend
            .fetch_artifact(
                &repo,
                &ReleaseSelector::Tag("9.9.9".to_string()),
                "pkg-9.9.9-py3-none-any.whl",
                cache.path(),
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::ReleaseNotFound { .. }));
    }
}
