use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::repo::User,
    news::{
        dto::NewsResponse,
        provider::{fetch_for_user, parse_facets, NewsError},
    },
    state::AppState,
};

const DEFAULT_MAX: usize = 10;

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/news/latest", get(latest))
        .route("/news/filtered", get(filtered))
        .route("/news/personalized/:user_id", get(personalized))
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub category: Option<String>,
    pub country: Option<String>,
    #[serde(default = "default_max")]
    pub max: usize,
}

fn default_max() -> usize {
    DEFAULT_MAX
}

fn news_error(e: NewsError) -> (StatusCode, String) {
    match e {
        NewsError::InvalidFacet { .. } => {
            warn!(error = %e, "rejected news query");
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        NewsError::Upstream(e) => {
            error!(error = %e, "news provider call failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch news".into(),
            )
        }
    }
}

#[instrument(skip(state))]
pub async fn latest(
    State(state): State<AppState>,
) -> Result<Json<NewsResponse>, (StatusCode, String)> {
    let (category, country) = parse_facets(None, None).map_err(news_error)?;
    let articles = state
        .news
        .fetch(category, country, DEFAULT_MAX)
        .await
        .map_err(news_error)?;
    Ok(Json(NewsResponse { articles }))
}

#[instrument(skip(state))]
pub async fn filtered(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Result<Json<NewsResponse>, (StatusCode, String)> {
    let (category, country) =
        parse_facets(q.category.as_deref(), q.country.as_deref()).map_err(news_error)?;
    let articles = state
        .news
        .fetch(category, country, q.max)
        .await
        .map_err(news_error)?;
    Ok(Json(NewsResponse { articles }))
}

#[instrument(skip(state))]
pub async fn personalized(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<NewsResponse>, (StatusCode, String)> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, %user_id, "find_by_id failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let articles = fetch_for_user(state.news.as_ref(), &user, DEFAULT_MAX)
        .await
        .map_err(news_error)?;
    Ok(Json(NewsResponse { articles }))
}
