//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and session
//! renewal, plus the cookie plumbing that carries the session token.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use messenger_core::domain::{Session, User};
use messenger_core::ports::collections;
use messenger_core::session::SESSION_COOKIE;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::extract_session_token;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

//=========================================================================================
// Cookie Helpers
//=========================================================================================

/// Builds the `Set-Cookie` value carrying the session token, with the
/// session's remaining lifetime as max-age. HttpOnly, no `Secure` flag,
/// matching the deployed configuration.
pub(crate) fn session_cookie(session: &Session) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        session.token,
        session.remaining_seconds(Utc::now())
    )
}

/// Builds the `Set-Cookie` value that clears the session cookie.
pub(crate) fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. The email is the unique business key; reject a second registration.
    let existing = state.identity.by_email(&req.email).await.map_err(|e| {
        error!("Failed to check email: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user".to_string())
    })?;
    if existing.is_some() {
        return Err((StatusCode::CONFLICT, "Email already registered".to_string()));
    }

    // 2. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_digest = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })?
        .to_string();

    // 3. Create the user document
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        name: req.name,
        email: req.email,
        password_digest,
        icon: None,
        is_online: true,
        created_at: now,
        updated_at: now,
    };
    let record = serde_json::to_value(&user).map_err(|e| {
        error!("Failed to encode user: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user".to_string())
    })?;
    state
        .store
        .put(collections::USERS, Some(&user.id.to_string()), record)
        .await
        .map_err(|e| {
            error!("Failed to create user: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user".to_string())
        })?;

    // 4. Create the session and attach it to the response
    let session = state.sessions.create_session(&user).await.map_err(|e| {
        error!("Failed to create session: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
    })?;

    let response = AuthResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&session))],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Get user by email. Unknown email and bad password are
    //    indistinguishable to the caller.
    let user = state
        .identity
        .by_email(&req.email)
        .await
        .map_err(|e| {
            error!("Failed to get user: {:?}", e);
            (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()))?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user.password_digest).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()));
    }

    // 3. Create the session
    let session = state.sessions.create_session(&user).await.map_err(|e| {
        error!("Failed to create session: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
    })?;

    // 4. Mark the user online. Best-effort: a failure here must not fail
    //    the login.
    if let Err(e) = state
        .store
        .update_field(collections::USERS, &user.id.to_string(), "is_online", json!(true))
        .await
    {
        warn!("Failed to set online flag: {e}");
    }

    let response = AuthResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
    };

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&session))],
        Json(response),
    ))
}

/// POST /auth/logout - Logout and revoke the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = extract_session_token(&headers);

    // 1. Mark the owner offline while the session can still name them.
    //    Best-effort: logout succeeds even without a usable session.
    if let Ok(authed) = state.sessions.validate_session(token).await {
        if let Err(e) = state
            .store
            .update_field(
                collections::USERS,
                &authed.user.id.to_string(),
                "is_online",
                json!(false),
            )
            .await
        {
            warn!("Failed to clear online flag: {e}");
        }
    }

    // 2. Revoke the session. Idempotent: an absent or unknown token is fine.
    state.sessions.revoke_session(token).await.map_err(|e| {
        error!("Failed to revoke session: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
    })?;

    // 3. Clear the cookie
    Ok((StatusCode::OK, [(header::SET_COOKIE, clear_session_cookie())]))
}

/// POST /auth/renew - Re-issue the current session with a fresh lifetime
#[utoipa::path(
    post,
    path = "/auth/renew",
    responses(
        (status = 200, description = "Session renewed"),
        (status = 401, description = "No usable session")
    )
)]
pub async fn renew_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = extract_session_token(&headers);

    let session = state.sessions.renew_session(token).await.map_err(|e| {
        // Any failure, storage included, reads as "not logged in".
        warn!("Failed to renew session: {e}");
        (StatusCode::UNAUTHORIZED, "No usable session".to_string())
    })?;

    Ok((StatusCode::OK, [(header::SET_COOKIE, session_cookie(&session))]))
}
