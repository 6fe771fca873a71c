//! Request handlers for the simple-repository surface
//!
//! Three operations: the root index of distribution names, the
//! per-distribution file listing, and the artifact download. Downloads
//! are served from the on-disk cache, fetching from the origin backend
//! on a miss.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use minijinja::context;
use tokio_util::io::ReaderStream;
use wheelhouse_core::WheelFilename;
use wheelhouse_index::{Backend, IndexError, ReleaseSelector, RepoHandle};

use crate::error::AppError;
use crate::render::{LISTING_TEMPLATE, ROOT_TEMPLATE};
use crate::state::AppState;

/// GET `/` - root index linking every registered distribution.
pub async fn root_index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let names = state.registry.names();
    if names.is_empty() && state.config.warn_empty_index {
        tracing::warn!("serving an index with no registered distributions");
    }

    let html = state
        .templates
        .get_template(ROOT_TEMPLATE)
        .and_then(|t| t.render(context! { names, base_path => &state.config.base_path }))
        .map_err(|e| AppError::Internal(format!("render failed: {e}")))?;
    Ok(Html(html))
}

/// GET `/simple/*path` - listing or download, depending on the path.
///
/// `pkg` and `pkg/` are listings; `pkg/<filename>` is a download. Axum
/// wildcard captures cannot distinguish these as separate routes, so the
/// split happens here.
pub async fn simple(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    match path.split_once('/') {
        None => listing(&state, &path).await,
        Some((name, "")) => listing(&state, name).await,
        Some((name, filename)) => download(&state, name, filename).await,
    }
}

/// Per-distribution listing: every wheel the origin knows about.
async fn listing(state: &AppState, name: &str) -> Result<Response, AppError> {
    let backend = lookup_backend(state, name)?;
    let repo = resolve_handle(backend.as_ref(), name).await?;
    let artifacts = backend.list_artifacts(&repo).await?;

    // Non-wheel assets and wheels for other distributions are the
    // origin's business, not ours; skip them rather than fail the page.
    let mut files = Vec::new();
    for artifact in &artifacts {
        match WheelFilename::parse(&artifact.name) {
            Ok(wheel) if wheel.is_for(name) => files.push(artifact.name.clone()),
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(asset = %artifact.name, %err, "skipping non-wheel asset");
            }
        }
    }

    files.sort_unstable();
    let html = state
        .templates
        .get_template(LISTING_TEMPLATE)
        .and_then(|t| {
            t.render(context! {
                name,
                files,
                base_path => &state.config.base_path,
            })
        })
        .map_err(|e| AppError::Internal(format!("render failed: {e}")))?;
    Ok(Html(html).into_response())
}

/// Artifact download, cache-first.
///
/// Concurrent misses on the same artifact serialize behind a per-key
/// lock so the origin sees a single fetch.
async fn download(state: &AppState, name: &str, filename: &str) -> Result<Response, AppError> {
    let backend = lookup_backend(state, name)?;

    // Reject malformed filenames before touching the origin.
    let wheel = WheelFilename::parse(filename)?;
    if !wheel.is_for(name) {
        return Err(AppError::BadRequest(format!(
            "wheel {filename} does not belong to distribution {name}"
        )));
    }

    if let Some(path) = state.store.lookup(name, filename) {
        return stream_file(&path, filename).await;
    }

    let lock = state.store.fetch_lock(name, filename);
    let _guard = lock.lock().await;
    // A concurrent request may have completed the fetch while we waited.
    if let Some(path) = state.store.lookup(name, filename) {
        return stream_file(&path, filename).await;
    }

    let repo = resolve_handle(backend.as_ref(), name).await?;
    let selector = ReleaseSelector::Tag(wheel.version.clone());
    let cache_dir = state.store.cache_dir(name);
    let record = backend
        .fetch_artifact(&repo, &selector, filename, &cache_dir, false)
        .await
        .map_err(|err| {
            tracing::error!(
                distribution = name,
                filename,
                backend = backend.kind().as_str(),
                %err,
                "artifact fetch failed"
            );
            AppError::from(err)
        })?;

    match record.and_then(|r| r.local_path) {
        Some(path) => stream_file(&path, filename).await,
        None => Err(AppError::NotFound(format!(
            "release {selector} of {name} has no asset {filename}"
        ))),
    }
}

fn lookup_backend(state: &AppState, name: &str) -> Result<Arc<dyn Backend>, AppError> {
    state.registry.get(name).ok_or_else(|| {
        IndexError::DistributionNotFound {
            name: name.to_string(),
        }
        .into()
    })
}

/// Resolve the origin's repository handle, substituting a synthetic one
/// for origin kinds that have no repository notion.
async fn resolve_handle(backend: &dyn Backend, name: &str) -> Result<RepoHandle, AppError> {
    match backend.get_repository(name).await {
        Ok(repo) => Ok(repo),
        Err(err) if err.is_unsupported() => Ok(RepoHandle::synthetic(name)),
        Err(err) => Err(err.into()),
    }
}

async fn stream_file(path: &FsPath, filename: &str) -> Result<Response, AppError> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
