//! HTTP surface: routes, handlers and HTML pages.

mod error;
mod handlers;
mod views;

use axum::{routing::get, Router};
use tokio::net::TcpListener;

use crate::feed::FeedClient;
use crate::storage::Database;

pub use error::{AppError, AppResult};

/// Shared, immutable request context.
///
/// Handlers acquire their own database connection from `db` per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub feeds: FeedClient,
}

impl AppState {
    pub fn new(db: Database, feeds: FeedClient) -> Self {
        Self { db, feeds }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::latest_episodes))
        .route("/add/", get(handlers::add_form).post(handlers::add_submit))
        .route("/list/", get(handlers::list_podcasts))
        .route("/podcast/", get(handlers::podcast_index))
        .route("/podcast/{name}", get(handlers::podcast_episodes))
        .with_state(state)
}

/// Serve the app on an already bound listener until the process is stopped.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Starting server on http://{}", addr);
    }
    axum::serve(listener, create_router(state)).await
}

/// `/podcast/<name>` with `name` percent-encoded as a single path segment.
pub(crate) fn podcast_path(name: &str) -> String {
    // byte_serialize writes spaces as '+', which is literal in a path
    let segment: String = url::form_urlencoded::byte_serialize(name.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("/podcast/{}", segment)
}
