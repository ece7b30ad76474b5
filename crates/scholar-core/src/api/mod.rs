//! HTTP surface
//!
//! | Method | Path                   | Handler                           |
//! |--------|------------------------|-----------------------------------|
//! | GET    | `/health`              | [`health::health_handler`]        |
//! | POST   | `/ask`                 | [`ask::ask_handler`]              |
//! | POST   | `/conversations`       | [`conversations::create_handler`] |
//! | GET    | `/conversations`       | [`conversations::list_handler`]   |
//! | GET    | `/conversations/{id}`  | [`conversations::get_handler`]    |
//! | DELETE | `/conversations/{id}`  | [`conversations::delete_handler`] |

pub mod ask;
pub mod conversations;
mod error;
pub mod health;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

pub use error::{ApiError, ApiResult};

use crate::routing::TutorRouter;

/// Shared handler state
pub type AppState = Arc<TutorRouter>;

/// Build the HTTP router over a tutor router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/ask", post(ask::ask_handler))
        .route(
            "/conversations",
            post(conversations::create_handler).get(conversations::list_handler),
        )
        .route(
            "/conversations/{id}",
            get(conversations::get_handler).delete(conversations::delete_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Parse a conversation id; malformed ids are reported as not found
pub(crate) fn parse_conversation_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::InvalidConversation(raw.to_string()))
}
