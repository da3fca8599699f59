//! # Auth HTTP Routes
//!
//! The public surface. Every response is the same JSON envelope
//! (`success`, `message`, plus any data keys) and every failure maps
//! through [`AuthError`]'s status table.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::errors::AuthError;
use crate::auth::service::AuthService;

use super::cookies::CookieSettings;
use super::session_guard::{session_guard, CurrentAccount};

// ==================
// Shared State
// ==================

/// State shared across handlers
pub struct AppState {
    pub auth: AuthService,
    pub cookies: CookieSettings,
}

// ==================
// Request Types
// ==================

// Missing body fields deserialize to empty strings so the service can
// answer with its own 400 instead of an extractor rejection.

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyAccountRequest {
    #[serde(default)]
    otp: String,
}

#[derive(Debug, Deserialize)]
pub struct SendResetOtpRequest {
    #[serde(default)]
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    otp: String,
    #[serde(default, rename = "newPassword")]
    new_password: String,
}

// ==================
// Envelope Helpers
// ==================

fn success_response(message: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": message })),
    )
        .into_response()
}

/// Convert error to HTTP response
fn error_response(err: AuthError) -> Response {
    let status = match err.status_code() {
        400 => StatusCode::BAD_REQUEST,
        401 => StatusCode::UNAUTHORIZED,
        404 => StatusCode::NOT_FOUND,
        409 => StatusCode::CONFLICT,
        410 => StatusCode::GONE,
        502 => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = json!({
        "success": false,
        "message": err.to_string(),
        "code": err.error_code(),
    });
    (status, Json(body)).into_response()
}

/// Success envelope plus a Set-Cookie header
fn with_cookie(cookie: String, message: &str) -> Response {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            let mut response = success_response(message);
            response.headers_mut().insert(header::SET_COOKIE, value);
            response
        }
        Err(e) => error_response(AuthError::Crypto(format!("Cookie encoding failed: {}", e))),
    }
}

// ==================
// Route Handlers
// ==================

/// GET / - Service banner
async fn index() -> impl IntoResponse {
    success_response("postern is running")
}

/// GET /health - Liveness check
async fn health() -> impl IntoResponse {
    success_response("ok")
}

/// POST /api/auth/register - Create an account and start a session
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> impl IntoResponse {
    match state
        .auth
        .register(&request.name, &request.email, &request.password)
        .await
    {
        Ok((_, token)) => with_cookie(state.cookies.session_cookie(&token), "Account registered"),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/login - Verify credentials and start a session
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    match state.auth.login(&request.email, &request.password).await {
        Ok((_, token)) => with_cookie(state.cookies.session_cookie(&token), "Logged in"),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/logout - Drop the session cookie
///
/// Succeeds whether or not a session was present; tokens themselves stay
/// valid until expiry, the cookie is the thing being discarded.
async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    with_cookie(state.cookies.clear_cookie(), "Logged out")
}

/// GET /api/auth/users - List every account
///
/// Unauthenticated by contract, which leaves the listing without an admin
/// gate. The projection keeps password hashes and outstanding codes
/// private.
async fn list_accounts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.auth.list_accounts().await {
        Ok(accounts) => {
            let users: Vec<Value> = accounts
                .iter()
                .map(|a| {
                    json!({
                        "id": a.id,
                        "name": a.name,
                        "email": a.email,
                        "isAccountVerified": a.is_verified,
                    })
                })
                .collect();
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": "Accounts fetched",
                    "users": users,
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/send-verify-otp - Email a verification code (session required)
async fn send_verify_otp(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<CurrentAccount>,
) -> impl IntoResponse {
    match state.auth.send_verify_otp(account.0).await {
        Ok(()) => success_response("Verification code sent"),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/verify-account - Consume a verification code (session required)
async fn verify_account(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<CurrentAccount>,
    Json(request): Json<VerifyAccountRequest>,
) -> impl IntoResponse {
    match state.auth.verify_email(account.0, &request.otp).await {
        Ok(()) => success_response("Account verified"),
        Err(e) => error_response(e),
    }
}

/// GET /api/user/profile - Owner view of the account (session required)
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(account): Extension<CurrentAccount>,
) -> impl IntoResponse {
    match state.auth.get_profile(account.0).await {
        Ok(profile) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Profile fetched",
                "name": profile.name,
                "isAccountVerified": profile.is_verified,
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/send-reset-otp - Email a password-reset code
async fn send_reset_otp(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendResetOtpRequest>,
) -> impl IntoResponse {
    match state.auth.send_reset_otp(&request.email).await {
        Ok(()) => success_response("Reset code sent"),
        Err(e) => error_response(e),
    }
}

/// POST /api/auth/reset-password - Consume a reset code and set a new password
async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> impl IntoResponse {
    match state
        .auth
        .reset_password(&request.email, &request.otp, &request.new_password)
        .await
    {
        Ok(()) => success_response("Password has been reset"),
        Err(e) => error_response(e),
    }
}

// ==================
// Router
// ==================

/// Build auth routes
pub fn auth_routes(state: Arc<AppState>) -> Router {
    let guarded = Router::new()
        .route("/api/auth/send-verify-otp", post(send_verify_otp))
        .route("/api/auth/verify-account", post(verify_account))
        .route("/api/user/profile", get(get_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), session_guard));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/users", get(list_accounts))
        .route("/api/auth/send-reset-otp", post(send_reset_otp))
        .route("/api/auth/reset-password", post(reset_password))
        .merge(guarded)
        .with_state(state)
}
