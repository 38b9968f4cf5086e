use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use super::error::AppResult;
use super::{podcast_path, views, AppState};
use crate::feed::FetchError;
use crate::ingest::{self, IngestError};

#[derive(Debug, Default, Deserialize)]
pub struct AddQuery {
    /// Podcast name that was requested but not found
    pub missing: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub podcast: String,
}

/// GET /add/
pub async fn add_form(Query(query): Query<AddQuery>) -> Html<String> {
    let notice = query.missing.map(|name| not_found_notice(&name));
    Html(views::add_page(notice.as_deref(), ""))
}

fn not_found_notice(name: &str) -> String {
    format!("{} not found in the system, please add the link to the feed!", name)
}

/// POST /add/
pub async fn add_submit(
    State(state): State<AppState>,
    Form(form): Form<AddForm>,
) -> AppResult<Response> {
    let link = form.podcast.trim();

    match ingest::add_podcast(&state.db, &state.feeds, link).await {
        Ok(outcome) => Ok(Redirect::to(&podcast_path(outcome.name())).into_response()),
        Err(IngestError::EmptyLink) => Ok(form_with_notice(
            StatusCode::BAD_REQUEST,
            "Please enter the link to a podcast feed.",
            link,
        )),
        Err(e @ IngestError::NoContent { .. }) => {
            Ok(form_with_notice(StatusCode::OK, &e.to_string(), link))
        }
        Err(IngestError::Fetch(e @ FetchError::InvalidUrl(_))) => {
            tracing::info!(link = %link, error = %e, "Rejected feed link");
            Ok(form_with_notice(
                StatusCode::UNPROCESSABLE_ENTITY,
                &e.to_string(),
                link,
            ))
        }
        Err(IngestError::Fetch(e)) => {
            tracing::warn!(link = %link, error = %e, "Could not load feed");
            Ok(form_with_notice(
                StatusCode::BAD_GATEWAY,
                &format!("Could not load '{}': {}", link, e),
                link,
            ))
        }
        Err(IngestError::Database(e)) => Err(e.into()),
    }
}

fn form_with_notice(status: StatusCode, notice: &str, value: &str) -> Response {
    (status, Html(views::add_page(Some(notice), value))).into_response()
}

/// GET /list/
pub async fn list_podcasts(State(state): State<AppState>) -> AppResult<Html<String>> {
    tracing::info!("Selecting list of podcasts");
    let mut conn = state.db.connect().await?;
    let podcasts = conn.list_podcasts().await?;
    Ok(Html(views::podcasts_page(&podcasts)))
}

/// GET /
pub async fn latest_episodes(State(state): State<AppState>) -> AppResult<Html<String>> {
    tracing::info!("Selecting latest episodes");
    let mut conn = state.db.connect().await?;
    let episodes = conn.latest_episodes().await?;
    Ok(Html(views::episodes_page("Latest episodes", &episodes)))
}

/// GET /podcast/
pub async fn podcast_index() -> Redirect {
    Redirect::to("/list/")
}

/// GET /podcast/{name}
pub async fn podcast_episodes(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Response> {
    tracing::info!(name = %name, "Looking up podcast");
    let mut conn = state.db.connect().await?;

    match conn.episodes_for_podcast(&name).await? {
        Some(listing) => {
            tracing::info!(name = %name, episodes = listing.episodes.len(), "Found podcast");
            Ok(Html(views::episodes_page(&listing.podcast.name, &listing.episodes)).into_response())
        }
        None => {
            tracing::info!(name = %name, "Podcast not found");
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("missing", &name)
                .finish();
            Ok(Redirect::to(&format!("/add/?{}", query)).into_response())
        }
    }
}
