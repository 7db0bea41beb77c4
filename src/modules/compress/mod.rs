use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub mod bitrate;
pub mod dto;
pub mod error;
pub mod handler;
pub mod service;
pub mod stream;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handler::index))
        .route("/compress", post(handler::compress_video))
        .route("/health", get(handler::health))
}
