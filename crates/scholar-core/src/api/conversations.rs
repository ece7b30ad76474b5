//! Conversation management endpoints

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppState, parse_conversation_id};
use crate::conversation::{ConversationInfo, ConversationSummary, Interaction};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateConversationRequest {
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationResponse {
    pub conversation_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub owner_id: Option<String>,
}

/// Conversation metadata together with its full history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub info: ConversationInfo,
    pub history: Vec<Interaction>,
}

/// `POST /conversations`
///
/// The body is optional; an empty body creates an anonymous conversation.
pub async fn create_handler(
    State(router): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CreateConversationResponse>)> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateConversationRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::Validation(format!("invalid request body: {}", e)))?
    };

    let conversation_id = router.create_conversation(request.owner_id);
    Ok((
        StatusCode::CREATED,
        Json(CreateConversationResponse { conversation_id }),
    ))
}

/// `GET /conversations?owner_id=...`
pub async fn list_handler(
    State(router): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<ConversationSummary>> {
    Json(router.list_conversations(params.owner_id.as_deref()))
}

/// `GET /conversations/{id}`
pub async fn get_handler(
    State(router): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ConversationDetail>> {
    let id = parse_conversation_id(&raw_id)?;
    let info = router
        .conversation_info(id)
        .ok_or_else(|| ApiError::InvalidConversation(raw_id.clone()))?;
    let history = router.conversation_history(id, None)?;

    Ok(Json(ConversationDetail { info, history }))
}

/// `DELETE /conversations/{id}`
pub async fn delete_handler(
    State(router): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_conversation_id(&raw_id)?;
    if router.delete_conversation(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::InvalidConversation(raw_id))
    }
}
