//! # Session Guard Middleware
//!
//! Sits in front of routes that require a logged-in account. The guard
//! resolves the session cookie to an account id and stashes it in the
//! request extensions; handlers behind it never see raw tokens.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use super::auth_routes::AppState;
use super::cookies;

/// Account id proven by the request's session cookie
#[derive(Debug, Clone, Copy)]
pub struct CurrentAccount(pub Uuid);

/// Reject the request unless it carries a valid session cookie
pub async fn session_guard(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let token = cookies::session_token_from_headers(request.headers());

    match state.auth.require_session(token.as_deref()) {
        Ok(account_id) => {
            request.extensions_mut().insert(CurrentAccount(account_id));
            Ok(next.run(request).await)
        }
        Err(err) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "message": err.to_string(),
                "code": err.error_code(),
            })),
        )),
    }
}
