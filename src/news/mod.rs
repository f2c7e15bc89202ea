use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod provider;

pub fn router() -> Router<AppState> {
    handlers::news_routes()
}
