//! Local build origin
//!
//! Serves artifacts produced by building a local source checkout. The
//! build runs at most once per process lifetime; the gate is held
//! across the whole build-and-mark sequence so concurrent first
//! requests cannot trigger two builds.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::backend::{
    ArtifactRecord, AssetLocator, Backend, BackendKind, ReleaseSelector, RepoHandle, base_filename,
    is_cached,
};
use crate::config::OriginDeclaration;
use crate::error::{IndexError, Result};

const WHEEL_EXT: &str = "whl";
const DEFAULT_BUILD_COMMAND: &[&str] = &["python", "-m", "build", "--wheel"];

/// Backend for a local source checkout origin
pub struct LocalBackend {
    declaration: OriginDeclaration,
    source_dir: PathBuf,
    /// Build-once gate; not shareable across processes
    built: Mutex<bool>,
}

impl LocalBackend {
    pub fn new(declaration: OriginDeclaration) -> Self {
        let source_dir = expand_home(declaration.uri.trim_start_matches("file://"));
        Self {
            declaration,
            source_dir,
            built: Mutex::new(false),
        }
    }

    /// Source checkout directory this origin builds.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    fn build_command(&self) -> Vec<String> {
        self.declaration
            .build_command
            .clone()
            .unwrap_or_else(|| DEFAULT_BUILD_COMMAND.iter().map(|s| s.to_string()).collect())
    }

    fn dist_dir(&self) -> PathBuf {
        self.source_dir.join("dist")
    }

    /// Run the build tool once per process lifetime. `force` rebuilds
    /// even when the flag is already set.
    pub async fn ensure_built(&self, force: bool) -> Result<()> {
        let mut built = self.built.lock().await;
        if *built && !force {
            return Ok(());
        }

        let argv = self.build_command();
        let (program, args) = argv.split_first().ok_or_else(|| IndexError::InvalidConfig {
            message: format!("Empty build command for origin {}", self.declaration.uri),
        })?;

        tracing::info!(
            source_dir = %self.source_dir.display(),
            command = %argv.join(" "),
            "building local origin"
        );
        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(&self.source_dir)
            .output()
            .await?;

        if !output.status.success() {
            let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
            captured.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(IndexError::BuildFailed {
                source_dir: self.source_dir.display().to_string(),
                status: output.status.code().unwrap_or(-1),
                output: captured,
            });
        }

        *built = true;
        Ok(())
    }

    /// Enumerate built wheels in the output directory, in filename order
    /// so listings are stable.
    fn scan_dist(&self) -> Result<Vec<ArtifactRecord>> {
        let dist = self.dist_dir();
        if !dist.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in std::fs::read_dir(&dist)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(WHEEL_EXT) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            records.push(ArtifactRecord {
                name: name.to_string(),
                locator: AssetLocator::File { path: path.clone() },
                local_path: None,
            });
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}

#[async_trait]
impl Backend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalBuild
    }

    fn origin_uri(&self) -> &str {
        &self.declaration.uri
    }

    async fn get_repository(&self, _distribution: &str) -> Result<RepoHandle> {
        // Local checkouts have no repository notion; callers substitute
        // a synthetic handle and go through list/fetch directly.
        Err(IndexError::Unsupported {
            backend: BackendKind::LocalBuild.as_str(),
            operation: "get_repository",
        })
    }

    async fn list_artifacts(&self, _repo: &RepoHandle) -> Result<Vec<ArtifactRecord>> {
        self.ensure_built(false).await?;
        self.scan_dist()
    }

    async fn fetch_artifact(
        &self,
        _repo: &RepoHandle,
        _selector: &ReleaseSelector,
        filename: &str,
        cache_dir: &Path,
        overwrite: bool,
    ) -> Result<Option<ArtifactRecord>> {
        let filename = base_filename(filename);
        let dest = cache_dir.join(filename);

        if !overwrite && is_cached(&dest) {
            tracing::debug!(path = %dest.display(), "artifact already cached, skipping build");
            return Ok(Some(ArtifactRecord {
                name: filename.to_string(),
                locator: AssetLocator::File { path: dest.clone() },
                local_path: Some(dest),
            }));
        }

        self.ensure_built(false).await?;

        let source = self.dist_dir().join(filename);
        if !source.exists() {
            return Ok(None);
        }

        tokio::fs::create_dir_all(cache_dir).await?;
        // Publish atomically: copy to a temporary sibling, then rename.
        let tmp = dest.with_file_name(format!(".{filename}.part"));
        match tokio::fs::copy(&source, &tmp).await {
            Ok(_) => tokio::fs::rename(&tmp, &dest).await?,
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e.into());
            }
        }

        Ok(Some(ArtifactRecord {
            name: filename.to_string(),
            locator: AssetLocator::File { path: source },
            local_path: Some(dest),
        }))
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declaration(dir: &Path, build_command: Vec<String>) -> OriginDeclaration {
        OriginDeclaration {
            uri: dir.to_string_lossy().into_owned(),
            distributions: vec!["pkg".to_string()],
            access_token: None,
            access_token_env: None,
            build_command: Some(build_command),
        }
    }

    /// Build command that appends a line to build.log, so invocations
    /// can be counted.
    fn counting_build(dir: &Path) -> Vec<String> {
        vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("echo built >> {}", dir.join("build.log").display()),
        ]
    }

    fn build_invocations(dir: &Path) -> usize {
        std::fs::read_to_string(dir.join("build.log"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    fn seed_dist(dir: &Path, names: &[&str]) {
        let dist = dir.join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        for name in names {
            std::fs::write(dist.join(name), b"wheel-bytes").unwrap();
        }
    }

    #[tokio::test]
    async fn test_build_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let backend = declaration(dir.path(), counting_build(dir.path()));
        let backend = LocalBackend::new(backend);

        backend.ensure_built(false).await.unwrap();
        backend.ensure_built(false).await.unwrap();
        assert_eq!(build_invocations(dir.path()), 1);

        backend.ensure_built(true).await.unwrap();
        assert_eq!(build_invocations(dir.path()), 2);
    }

    #[tokio::test]
    async fn test_build_failure_captures_output() {
        let dir = tempfile::tempdir().unwrap();
        let decl = declaration(
            dir.path(),
            vec![
                "sh".to_string(),
                "-c".to_string(),
                "echo compile error >&2; exit 3".to_string(),
            ],
        );
        let backend = LocalBackend::new(decl);

        let err = backend.ensure_built(false).await.unwrap_err();
        match err {
            IndexError::BuildFailed { status, output, .. } => {
                assert_eq!(status, 3);
                assert!(output.contains("compile error"));
            }
            other => panic!("expected BuildFailed, got {other:?}"),
        }

        // A failed build leaves the gate open for a retry.
        assert!(backend.ensure_built(false).await.is_err());
        let repo = RepoHandle::synthetic("pkg");
        assert!(backend.list_artifacts(&repo).await.is_err());
    }

    #[tokio::test]
    async fn test_list_artifacts_scans_dist() {
        let dir = tempfile::tempdir().unwrap();
        seed_dist(
            dir.path(),
            &[
                "pkg-2.0.0-py3-none-any.whl",
                "pkg-1.0.0-py3-none-any.whl",
                "notes.txt",
            ],
        );
        let backend = LocalBackend::new(declaration(dir.path(), counting_build(dir.path())));

        let repo = RepoHandle::synthetic("pkg");
        let artifacts = backend.list_artifacts(&repo).await.unwrap();
        let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["pkg-1.0.0-py3-none-any.whl", "pkg-2.0.0-py3-none-any.whl"]
        );
    }

    #[tokio::test]
    async fn test_fetch_copies_into_cache() {
        let dir = tempfile::tempdir().unwrap();
        seed_dist(dir.path(), &["pkg-1.0.0-py3-none-any.whl"]);
        let backend = LocalBackend::new(declaration(dir.path(), counting_build(dir.path())));

        let cache = tempfile::tempdir().unwrap();
        let repo = RepoHandle::synthetic("pkg");
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
            .expect("wheel exists in dist");

        let local = record.local_path.unwrap();
        assert_eq!(local, cache.path().join("pkg-1.0.0-py3-none-any.whl"));
        assert_eq!(std::fs::read(&local).unwrap(), b"wheel-bytes");
    }

    #[tokio::test]
    async fn test_fetch_missing_wheel_is_none() {
        let dir = tempfile::tempdir().unwrap();
        seed_dist(dir.path(), &["pkg-1.0.0-py3-none-any.whl"]);
        let backend = LocalBackend::new(declaration(dir.path(), counting_build(dir.path())));

        let cache = tempfile::tempdir().unwrap();
        let repo = RepoHandle::synthetic("pkg");
        let record = backend
            .fetch_artifact(
                &repo,
                &ReleaseSelector::Tag("9.9.9".to_string()),
                "pkg-9.9.9-py3-none-any.whl",
                cache.path(),
                false,
            )
            .await
            .unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_cached_fetch_skips_build() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(declaration(dir.path(), counting_build(dir.path())));

        let cache = tempfile::tempdir().unwrap();
        std::fs::write(
            cache.path().join("pkg-1.0.0-py3-none-any.whl"),
            b"already-here",
        )
        .unwrap();

        let repo = RepoHandle::synthetic("pkg");
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
            .unwrap();

        assert!(record.local_path.is_some());
        assert_eq!(build_invocations(dir.path()), 0);
    }

    #[test]
    fn test_get_repository_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(declaration(dir.path(), vec!["true".to_string()]));

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = rt.block_on(backend.get_repository("pkg")).unwrap_err();
        assert!(err.is_unsupported());
    }
}
