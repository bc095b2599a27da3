//! Middleware for session token validation and role checks

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{ShopError, ShopResult},
    models::Role,
    state::AppState,
};

/// Identity of the caller, resolved from a live session
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: u32,
    pub username: String,
    pub role: Role,
    pub session_id: Uuid,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resolve the bearer token and add the caller to request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> ShopResult<Response> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ShopError::Unauthorized)?;

    let auth = state.sessions.validate(bearer.token()).await?;
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

/// Reject callers without the admin role; runs after `auth_middleware`
pub async fn admin_middleware(req: Request<Body>, next: Next) -> ShopResult<Response> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(ShopError::Unauthorized)?;

    if !auth.is_admin() {
        warn!(
            "User {} denied admin access to {}",
            auth.username, req.uri()
        );
        return Err(ShopError::Forbidden("Admin access required".to_string()));
    }

    Ok(next.run(req).await)
}
