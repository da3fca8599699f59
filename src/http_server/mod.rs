//! # Postern HTTP Server
//!
//! Axum transport over the auth service. CORS is locked to a single
//! configured origin because the session cookie rides on credentialed
//! requests.

pub mod auth_routes;
pub mod cookies;
pub mod session_guard;

pub use auth_routes::{auth_routes, AppState};
pub use cookies::{CookieSettings, SameSitePolicy, SESSION_COOKIE};
pub use session_guard::CurrentAccount;

use std::io;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Browser origin allowed to send credentialed requests; empty
    /// disables CORS entirely (same-origin deployments)
    pub cors_origin: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 4000,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

/// The postern HTTP server
pub struct HttpServer {
    config: HttpServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Assemble the full router with CORS and request tracing
    pub fn router(&self) -> io::Result<Router> {
        let mut router = auth_routes(self.state.clone());

        if !self.config.cors_origin.is_empty() {
            let origin = HeaderValue::from_str(&self.config.cors_origin).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("Invalid CORS origin '{}': {}", self.config.cors_origin, e),
                )
            })?;
            // allow_credentials is what lets the session cookie through;
            // it forbids wildcard origins, hence the single exact origin.
            let cors = CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true);
            router = router.layer(cors);
        }

        Ok(router.layer(TraceLayer::new_for_http()))
    }

    /// Bind and serve until the process is stopped
    pub async fn start(&self) -> io::Result<()> {
        let router = self.router()?;
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!(addr = %addr, "postern listening");
        axum::serve(listener, router).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account::InMemoryAccountRepository;
    use crate::auth::email::LogEmailSender;
    use crate::auth::jwt::SessionTokens;
    use crate::auth::service::{AuthConfig, AuthService};

    fn test_state() -> Arc<AppState> {
        let repo = Arc::new(InMemoryAccountRepository::new());
        Arc::new(AppState {
            auth: AuthService::new(
                repo,
                Arc::new(LogEmailSender),
                SessionTokens::new("server-test-secret-0123456789abcdef", 7),
                AuthConfig::default(),
            ),
            cookies: CookieSettings::default(),
        })
    }

    #[test]
    fn test_router_builds_with_cors() {
        let server = HttpServer::new(HttpServerConfig::default(), test_state());
        assert!(server.router().is_ok());
    }

    #[test]
    fn test_router_builds_without_cors() {
        let config = HttpServerConfig {
            cors_origin: String::new(),
            ..HttpServerConfig::default()
        };
        let server = HttpServer::new(config, test_state());
        assert!(server.router().is_ok());
    }

    #[test]
    fn test_router_rejects_malformed_origin() {
        let config = HttpServerConfig {
            cors_origin: "not a header\nvalue".to_string(),
            ..HttpServerConfig::default()
        };
        let server = HttpServer::new(config, test_state());
        assert!(server.router().is_err());
    }
}
