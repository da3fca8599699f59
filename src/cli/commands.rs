//! CLI command implementations
//!
//! `serve` wires the configured store, mailer, and token signer into one
//! `AuthService` and hands it to the HTTP server. `init` writes the
//! commented configuration template and never overwrites.

use std::path::Path;
use std::sync::Arc;

use crate::auth::account::{AccountRepository, InMemoryAccountRepository};
use crate::auth::email::{EmailSender, LogEmailSender, SmtpEmailSender};
use crate::auth::jwt::SessionTokens;
use crate::auth::service::{AuthConfig, AuthService};
use crate::config::{default_config_toml, Config, JWT_SECRET_ENV};
use crate::http_server::cookies::{CookieSettings, SameSitePolicy};
use crate::http_server::{AppState, HttpServer, HttpServerConfig};
use crate::storage::json_file::JsonFileAccountRepository;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Init { config } => init(&config),
        Command::Serve { config, port } => serve(&config, port).await,
    }
}

/// `postern init` - write the configuration template
fn init(path: &Path) -> CliResult<()> {
    if path.exists() {
        return Err(CliError::AlreadyExists(path.display().to_string()));
    }
    std::fs::write(path, default_config_toml())?;

    println!("Wrote configuration template to {}", path.display());
    println!("Set auth.jwt_secret (or {}) before starting.", JWT_SECRET_ENV);
    Ok(())
}

/// `postern serve` - validate config, build the service, run the server
async fn serve(path: &Path, port_override: Option<u16>) -> CliResult<()> {
    let mut config = if path.exists() {
        Config::load(path).map_err(|e| CliError::config_error(e.to_string()))?
    } else {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        Config::from_defaults()
    };
    if let Some(port) = port_override {
        config.server.port = port;
    }

    if let Err(errors) = config.validate() {
        for error in &errors {
            tracing::error!("{}", error);
        }
        return Err(CliError::config_error(format!(
            "{} invalid configuration value(s)",
            errors.len()
        )));
    }

    let state = build_state(&config).await?;
    let server = HttpServer::new(
        HttpServerConfig {
            bind_addr: config.server.bind_addr.clone(),
            port: config.server.port,
            cors_origin: config.server.cors_origin.clone(),
        },
        state,
    );
    server.start().await?;
    Ok(())
}

/// Assemble the shared application state from a validated config
pub async fn build_state(config: &Config) -> CliResult<Arc<AppState>> {
    let repo: Arc<dyn AccountRepository> = match config.storage.backend.as_str() {
        "memory" => Arc::new(InMemoryAccountRepository::new()),
        _ => Arc::new(JsonFileAccountRepository::new(&config.storage.path)),
    };
    repo.bootstrap()
        .await
        .map_err(|e| CliError::Startup(e.to_string()))?;

    let mailer: Arc<dyn EmailSender> = if config.smtp.enabled {
        Arc::new(
            SmtpEmailSender::new(
                &config.smtp.relay,
                config.smtp.port,
                &config.smtp.username,
                &config.smtp.password,
                &config.smtp.from,
            )
            .map_err(|e| CliError::Startup(e.to_string()))?,
        )
    } else {
        tracing::info!("SMTP disabled; outbound email goes to the log");
        Arc::new(LogEmailSender)
    };

    let same_site = SameSitePolicy::parse(&config.server.cookie_same_site).ok_or_else(|| {
        CliError::config_error(format!(
            "Invalid cookie_same_site '{}'",
            config.server.cookie_same_site
        ))
    })?;

    let tokens = SessionTokens::new(&config.auth.jwt_secret, config.auth.token_ttl_days);
    let max_age_secs = tokens.ttl_seconds();
    let auth = AuthService::new(
        repo,
        mailer,
        tokens,
        AuthConfig {
            verify_otp_ttl_hours: config.auth.verify_otp_ttl_hours,
            reset_otp_ttl_minutes: config.auth.reset_otp_ttl_minutes,
        },
    );

    Ok(Arc::new(AppState {
        auth,
        cookies: CookieSettings {
            secure: config.server.cookie_secure,
            same_site,
            max_age_secs,
        },
    }))
}
