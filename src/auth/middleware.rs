use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::user::Role;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = {
        let token = bearer_token(request.headers())?;
        state.tokens.verify(token)?
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Must run inside `require_auth`.
pub async fn require_role(
    State(role): State<Role>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

    if caller.role != role {
        debug!(user_id = %caller.id, role = %caller.role, required = %role, "role check failed");
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))
}
