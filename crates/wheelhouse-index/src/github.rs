//! GitHub REST client
//!
//! Minimal client for the release surface wheelhouse needs: repository
//! lookup, release enumeration, release-by-tag resolution and streamed
//! asset downloads. One client is created lazily per origin and reused
//! for every request against it.

use std::path::Path;

use futures::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;

use crate::error::{IndexError, Result};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const ACCEPT_JSON: &str = "application/vnd.github+json";
const ACCEPT_BINARY: &str = "application/octet-stream";
const RELEASES_PER_PAGE: usize = 100;

/// GitHub repository, as returned by `GET /repos/{full_name}`
#[derive(Debug, Clone, Deserialize)]
pub struct Repo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
}

/// GitHub release
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Release asset
#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub id: u64,
    pub name: String,
    /// API URL; downloading this with an octet-stream Accept header
    /// yields the binary content (works for private repositories, unlike
    /// the browser URL).
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

/// Authenticated GitHub API client
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GithubClient {
    /// Create a client against api.github.com.
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE, token)
    }

    /// Create a client against a custom API base URL (used by tests).
    pub fn with_api_base(api_base: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| IndexError::Upstream {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .header(reqwest::header::USER_AGENT, "wheelhouse");
        if let Some(token) = &self.token {
            // reqwest strips the Authorization header on cross-origin
            // redirects, which covers the S3 hop asset downloads take.
            req = req.bearer_auth(token);
        }
        req
    }

    /// Send a GET and map non-success statuses to errors. A 404 is
    /// reported as `UpstreamStatus` and refined by callers that know
    /// what was being looked up.
    async fn get(&self, url: &str, accept: &str) -> Result<reqwest::Response> {
        let response = self.request(url, accept).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(IndexError::AuthFailed {
                message: format!("Unauthorized request to {}", url),
            });
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(IndexError::AuthFailed {
                message: format!("Access denied to {}", url),
            });
        }
        if !status.is_success() {
            return Err(IndexError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    /// Look up a repository by `owner/name`.
    pub async fn get_repo(&self, full_name: &str) -> Result<Repo> {
        let url = format!("{}/repos/{}", self.api_base, full_name);
        match self.get(&url, ACCEPT_JSON).await {
            Ok(response) => Ok(response.json().await?),
            Err(IndexError::UpstreamStatus { status: 404, .. }) => {
                Err(IndexError::RepositoryNotFound {
                    name: full_name.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// List every release of a repository, following pagination.
    pub async fn list_releases(&self, full_name: &str) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        let mut page = 1;

        loop {
            let url = format!(
                "{}/repos/{}/releases?per_page={}&page={}",
                self.api_base, full_name, RELEASES_PER_PAGE, page
            );
            let batch: Vec<Release> = self.get(&url, ACCEPT_JSON).await?.json().await?;
            let batch_len = batch.len();
            releases.extend(batch);

            if batch_len < RELEASES_PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(releases)
    }

    /// Resolve a release by its tag name. `Ok(None)` when the tag does
    /// not exist.
    pub async fn get_release_by_tag(
        &self,
        full_name: &str,
        tag: &str,
    ) -> Result<Option<Release>> {
        let url = format!("{}/repos/{}/releases/tags/{}", self.api_base, full_name, tag);
        match self.get(&url, ACCEPT_JSON).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(IndexError::UpstreamStatus { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Download an asset's binary content to `dest`, streaming in
    /// bounded chunks. The file is written to a temporary sibling and
    /// renamed into place on completion, so a failed or aborted download
    /// never leaves a partial file at `dest`.
    pub async fn download_asset(&self, asset: &Asset, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = temp_sibling(dest);
        let result = self.download_to_temp(asset, &tmp).await;
        match result {
            Ok(()) => {
                tokio::fs::rename(&tmp, dest).await?;
                Ok(())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(e)
            }
        }
    }

    async fn download_to_temp(&self, asset: &Asset, tmp: &Path) -> Result<()> {
        let response = self.get(&asset.url, ACCEPT_BINARY).await?;

        let mut file = tokio::fs::File::create(tmp).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

/// Temporary download path next to the destination, same filesystem so
/// the final rename is atomic.
fn temp_sibling(dest: &Path) -> std::path::PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    dest.with_file_name(format!(".{}.part", name))
}
