//! Question answering endpoint

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState, parse_conversation_id};
use crate::routing::{Category, ReplyStatus};

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub query: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Specialist tag, or `"auto"` to classify
    #[serde(default)]
    pub preferred_specialist: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub response: String,
    pub conversation_id: Uuid,
    pub specialist: Category,
    pub status: ReplyStatus,
}

/// `POST /ask`
pub async fn ask_handler(
    State(router): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> ApiResult<Json<AskResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let conversation_id = request
        .conversation_id
        .as_deref()
        .map(parse_conversation_id)
        .transpose()?;

    let reply = router
        .handle_query(
            &request.query,
            conversation_id,
            request.preferred_specialist.as_deref(),
        )
        .await?;

    Ok(Json(AskResponse {
        response: reply.response,
        conversation_id: reply.conversation_id,
        specialist: reply.specialist,
        status: reply.status,
    }))
}
