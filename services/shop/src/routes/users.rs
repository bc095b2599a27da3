//! Registration, login and account endpoints

use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use super::ApiJson;
use crate::{
    error::{ShopError, ShopResult},
    middleware::AuthContext,
    models::{
        ApiResponse, ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
        UserProfile,
    },
    state::AppState,
    validation::{validate_email, validate_password, validate_username},
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
}

pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/api/logout", post(logout))
        .route("/api/user/info", get(user_info))
        .route("/api/user/change-password", post(change_password))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): ApiJson<RegisterRequest>,
) -> ShopResult<Json<ApiResponse<UserProfile>>> {
    let username = payload.username.trim();
    validate_username(username)?;
    validate_password(&payload.password)?;
    validate_email(payload.email.trim())?;

    let user = state
        .users
        .register(username, &payload.password, payload.email.trim())
        .await?;

    info!("Registered user {} with id {}", user.username, user.id);
    Ok(Json(ApiResponse::ok_with_message(
        "Registration successful",
        UserProfile::from(&user),
    )))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): ApiJson<LoginRequest>,
) -> ShopResult<Json<ApiResponse<LoginResponse>>> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(ShopError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    if !state.login_limiter.is_allowed(username).await {
        warn!("Login throttled for user: {}", username);
        return Err(ShopError::TooManyAttempts);
    }

    let user = state.users.authenticate(username, &payload.password).await?;
    state.login_limiter.reset(username).await;

    let session = state.sessions.issue(&user).await?;
    info!("User {} logged in", user.username);

    Ok(Json(ApiResponse::ok_with_message(
        "Login successful",
        LoginResponse {
            token: session.token,
            token_type: "Bearer".to_string(),
            expires_in: state.sessions.ttl(),
            user: UserProfile::from(&user),
        },
    )))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Json<ApiResponse<()>> {
    state.sessions.revoke(auth.session_id).await;
    info!("User {} logged out", auth.username);
    Json(ApiResponse::message("Logged out"))
}

/// Current user, re-read from the store
pub async fn user_info(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ShopResult<Json<ApiResponse<UserProfile>>> {
    let user = state
        .users
        .find_by_id(auth.user_id)
        .await
        .ok_or_else(|| ShopError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(UserProfile::from(&user))))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(payload), _): ApiJson<ChangePasswordRequest>,
) -> ShopResult<Json<ApiResponse<()>>> {
    validate_password(&payload.new_password)?;

    state
        .users
        .change_password(auth.user_id, &payload.old_password, &payload.new_password)
        .await?;
    state
        .sessions
        .revoke_others(auth.user_id, auth.session_id)
        .await;

    Ok(Json(ApiResponse::message("Password changed")))
}
