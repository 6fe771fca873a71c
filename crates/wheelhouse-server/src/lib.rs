//! Wheelhouse Server - the simple-repository HTTP surface
//!
//! Serves the PEP 503 style pages for the distributions in the
//! registry: a root index, per-distribution listings and cached
//! artifact downloads.

pub mod error;
pub mod render;
pub mod routes;
pub mod state;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Build the application router.
///
/// When `base_path` is configured the whole surface is nested under it,
/// e.g. `/pypi/simple/<name>/`.
pub fn app(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(routes::root_index))
        .route("/simple/*path", get(routes::simple))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    match state.config.base_path.as_str() {
        "" | "/" => routes,
        base => Router::new().nest(base, routes),
    }
}
