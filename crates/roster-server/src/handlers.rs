//! HTTP handlers. Each one authorizes, calls the lifecycle service and
//! shapes the response; no business rules live here.

use axum::{
    Form, Json,
    extract::{
        Path, Query, State,
        rejection::{FormRejection, JsonRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use roster_auth::gate::{ADMIN_OR_MANAGER, ANY_SIGNED_IN, resolve_current_user};
use roster_core::models::user::{User, UserDraft, UserPatch};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    state
        .gate
        .require(bearer_token(headers), ADMIN_OR_MANAGER)?;
    Ok(())
}

// -----------------------------------------------------------------------
// Administrative user management
// -----------------------------------------------------------------------

pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<User>> {
    require_admin(&state, &headers)?;
    let user = state
        .users
        .get_by_id(user_id)
        .await?
        .ok_or_else(AppError::user_not_found)?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> AppResult<Json<User>> {
    require_admin(&state, &headers)?;
    let Json(patch) = body?;
    Ok(Json(state.users.update(user_id, patch).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_admin(&state, &headers)?;
    if state.users.delete(user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::user_not_found())
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UserDraft>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state, &headers)?;
    let Json(draft) = body?;
    let user = state.users.create(draft).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub items: Vec<User>,
    pub total: u64,
    pub page: u64,
    pub size: usize,
}

pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> AppResult<Json<UserPage>> {
    require_admin(&state, &headers)?;
    if params.skip < 0 || params.limit <= 0 {
        return Err(AppError::bad_request("Invalid pagination parameters"));
    }
    let (skip, limit) = (params.skip as u64, params.limit as u64);

    let result = state.users.list_users(skip, limit).await?;
    Ok(Json(UserPage {
        size: result.items.len(),
        total: result.total,
        page: skip / limit + 1,
        items: result.items,
    }))
}

pub async fn set_professional(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((user_id, flag)): Path<(Uuid, bool)>,
) -> AppResult<Json<User>> {
    require_admin(&state, &headers)?;
    Ok(Json(
        state.users.update_professional_status(user_id, flag).await?,
    ))
}

pub async fn unlock_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&state, &headers)?;
    if state.users.unlock_account(user_id).await? {
        Ok(Json(json!({ "message": "Account unlocked" })))
    } else {
        Err(AppError::user_not_found())
    }
}

// -----------------------------------------------------------------------
// Self-service
// -----------------------------------------------------------------------

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<UserDraft>, JsonRejection>,
) -> AppResult<Json<User>> {
    let Json(draft) = body?;
    Ok(Json(state.users.register(draft).await?))
}

/// OAuth2 password-flow form. `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Form<LoginForm>, FormRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Form(form) = body?;
    let out = state
        .users
        .login_with_token(&form.username, &form.password)
        .await?;
    Ok(Json(TokenResponse {
        access_token: out.access_token,
        token_type: out.token_type,
    }))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Path((user_id, token)): Path<(Uuid, String)>,
) -> AppResult<Json<serde_json::Value>> {
    if state.users.verify_email(user_id, &token).await? {
        Ok(Json(json!({ "message": "Email verified successfully" })))
    } else {
        Err(roster_core::error::RosterError::InvalidOrExpiredToken.into())
    }
}

pub async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UserPatch>, JsonRejection>,
) -> AppResult<Json<User>> {
    let identity = state.gate.require(bearer_token(&headers), ANY_SIGNED_IN)?;
    let Json(patch) = body?;
    let current = resolve_current_user(&identity, state.users.repository()).await?;
    Ok(Json(state.users.update_profile(&current.email, patch).await?))
}
