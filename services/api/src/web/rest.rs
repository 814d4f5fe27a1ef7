//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use messenger_core::domain::{AuthenticatedSession, ConversationSummary, Message, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::renew_handler,
        list_conversations_handler,
        start_conversation_handler,
        post_message_handler,
        lookup_user_handler,
    ),
    components(
        schemas(
            crate::web::auth::SignupRequest,
            crate::web::auth::LoginRequest,
            crate::web::auth::AuthResponse,
            ConversationResponse,
            CounterpartResponse,
            MessageResponse,
            StartConversationRequest,
            StartConversationResponse,
            PostMessageRequest,
            UserProfileResponse,
        )
    ),
    tags(
        (name = "Messenger API", description = "API endpoints for the browser messenger.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct CounterpartResponse {
    pub id: Uuid,
    pub name: String,
    pub icon: Option<String>,
    pub is_online: bool,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            sender_name: m.sender_name,
            content: m.content,
            created_at: m.created_at,
            is_read: m.is_read,
        }
    }
}

/// One entry of the recency-ordered conversation list.
#[derive(Serialize, ToSchema)]
pub struct ConversationResponse {
    pub chat_id: Uuid,
    pub counterpart: CounterpartResponse,
    pub messages: Vec<MessageResponse>,
    pub last_activity: DateTime<Utc>,
}

impl From<ConversationSummary> for ConversationResponse {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            chat_id: summary.chat_id,
            counterpart: CounterpartResponse {
                id: summary.counterpart.id,
                name: summary.counterpart.name,
                icon: summary.counterpart.icon,
                is_online: summary.counterpart.is_online,
            },
            messages: summary.messages.into_iter().map(MessageResponse::from).collect(),
            last_activity: summary.last_activity,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct StartConversationRequest {
    pub counterpart_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct StartConversationResponse {
    pub chat_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub icon: Option<String>,
    pub is_online: bool,
}

impl From<User> for UserProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            icon: user.icon,
            is_online: user.is_online,
        }
    }
}

#[derive(Deserialize)]
pub struct LookupParams {
    pub email: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the authenticated user's conversations, most recent first.
#[utoipa::path(
    get,
    path = "/conversations",
    responses(
        (status = 200, description = "Ordered conversation list", body = [ConversationResponse]),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_conversations_handler(
    State(state): State<Arc<AppState>>,
    Extension(authed): Extension<AuthenticatedSession>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // Per-chat problems are already swallowed inside the aggregator; an
    // error here means the enumeration itself failed.
    let summaries = state
        .conversations
        .get_conversations(&authed.user)
        .await
        .map_err(|e| {
            error!("Failed to list conversations: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list conversations".to_string(),
            )
        })?;

    let body: Vec<ConversationResponse> =
        summaries.into_iter().map(ConversationResponse::from).collect();
    Ok(Json(body))
}

/// Start a new conversation with another user.
#[utoipa::path(
    post,
    path = "/conversations",
    request_body = StartConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = StartConversationResponse),
        (status = 404, description = "Counterpart does not exist"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn start_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(authed): Extension<AuthenticatedSession>,
    Json(req): Json<StartConversationRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // The counterpart must exist, but nothing stops a second thread with
    // the same pair: repeated calls open parallel conversations.
    let counterpart = state
        .identity
        .by_id(req.counterpart_id)
        .await
        .map_err(|e| {
            error!("Failed to resolve counterpart: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to start conversation".to_string(),
            )
        })?;
    if counterpart.is_none() {
        return Err((StatusCode::NOT_FOUND, "No such user".to_string()));
    }

    let chat_id = state
        .conversations
        .start_conversation(&authed.user, req.counterpart_id)
        .await
        .map_err(|e| {
            error!("Failed to start conversation: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to start conversation".to_string(),
            )
        })?;

    Ok((StatusCode::CREATED, Json(StartConversationResponse { chat_id })))
}

/// Post a message into a conversation.
#[utoipa::path(
    post,
    path = "/conversations/{chat_id}/messages",
    request_body = PostMessageRequest,
    responses(
        (status = 201, description = "Message appended", body = MessageResponse),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("chat_id" = Uuid, Path, description = "The chat to append to.")
    )
)]
pub async fn post_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(authed): Extension<AuthenticatedSession>,
    Path(chat_id): Path<Uuid>,
    Json(req): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let message = state
        .conversations
        .append_message(chat_id, authed.user.id, &authed.user.name, &req.content)
        .await
        .map_err(|e| {
            error!("Failed to append message: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send message".to_string(),
            )
        })?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Look up a user by their exact email address.
#[utoipa::path(
    get,
    path = "/users/lookup",
    responses(
        (status = 200, description = "Matching user", body = UserProfileResponse),
        (status = 404, description = "No such user"),
        (status = 401, description = "Not logged in")
    ),
    params(
        ("email" = String, Query, description = "Email address to look up.")
    )
)]
pub async fn lookup_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(_authed): Extension<AuthenticatedSession>,
    Query(params): Query<LookupParams>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .identity
        .by_email(&params.email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed".to_string())
        })?
        .ok_or((StatusCode::NOT_FOUND, "No such user".to_string()))?;

    Ok(Json(UserProfileResponse::from(user)))
}
