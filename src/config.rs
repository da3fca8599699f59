//! # Configuration
//!
//! TOML configuration for the postern server. Every field has a default
//! so a partial file is fine, but startup validates the result and
//! refuses to run with values that cannot work.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::http_server::cookies::SameSitePolicy;

/// Environment variable that overrides `auth.jwt_secret`
pub const JWT_SECRET_ENV: &str = "POSTERN_JWT_SECRET";

/// Environment variable that overrides `smtp.password`
pub const SMTP_PASSWORD_ENV: &str = "POSTERN_SMTP_PASSWORD";

// ==================
// Load Errors
// ==================

/// Errors while reading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ==================
// Validation Errors
// ==================

/// A single rejected configuration value
#[derive(Debug)]
pub struct ConfigValidationError {
    pub field: String,
    pub value: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid configuration for '{}': {} (value: {})",
            self.field, self.message, self.value
        )
    }
}

impl std::error::Error for ConfigValidationError {}

// ==================
// Sections
// ==================

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser origin allowed to send credentialed requests; empty
    /// disables CORS (same-origin deployments)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Stamp the session cookie with the Secure attribute
    #[serde(default)]
    pub cookie_secure: bool,

    /// SameSite attribute: strict, lax, or none
    #[serde(default = "default_cookie_same_site")]
    pub cookie_same_site: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_cookie_same_site() -> String {
    "strict".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            cookie_secure: false,
            cookie_same_site: default_cookie_same_site(),
        }
    }
}

/// Auth section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret; prefer the environment variable over the
    /// file so the secret stays out of version control
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,

    #[serde(default = "default_verify_otp_ttl_hours")]
    pub verify_otp_ttl_hours: i64,

    #[serde(default = "default_reset_otp_ttl_minutes")]
    pub reset_otp_ttl_minutes: i64,
}

fn default_token_ttl_days() -> i64 {
    7
}

fn default_verify_otp_ttl_hours() -> i64 {
    24
}

fn default_reset_otp_ttl_minutes() -> i64 {
    15
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_days: default_token_ttl_days(),
            verify_otp_ttl_hours: default_verify_otp_ttl_hours(),
            reset_otp_ttl_minutes: default_reset_otp_ttl_minutes(),
        }
    }
}

/// Storage section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "file" for the JSON file store, "memory" for ephemeral
    #[serde(default = "default_backend")]
    pub backend: String,

    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_backend() -> String {
    "file".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./postern-data/accounts.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
        }
    }
}

/// SMTP section; disabled means codes are written to the log instead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub relay: String,

    /// Override the relay's TLS port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// From address, e.g. "Postern <no-reply@example.com>"
    #[serde(default)]
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            relay: String::new(),
            port: None,
            username: String::new(),
            password: String::new(),
            from: String::new(),
        }
    }
}

// ==================
// Config
// ==================

/// Full postern configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,
}

impl Config {
    /// Load a configuration file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::parse(&content, path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults plus environment overrides (no file on disk)
    pub fn from_defaults() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
            if !secret.is_empty() {
                self.auth.jwt_secret = secret;
            }
        }
        if let Ok(password) = std::env::var(SMTP_PASSWORD_ENV) {
            if !password.is_empty() {
                self.smtp.password = password;
            }
        }
    }

    /// Validate every section; collects all problems instead of stopping
    /// at the first one
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();
        let mut error = |field: &str, value: String, message: &str| {
            errors.push(ConfigValidationError {
                field: field.to_string(),
                value,
                message: message.to_string(),
            });
        };

        if self.server.port == 0 {
            error(
                "server.port",
                self.server.port.to_string(),
                "Port must be between 1 and 65535",
            );
        }
        if self.server.bind_addr.trim().is_empty() {
            error(
                "server.bind_addr",
                self.server.bind_addr.clone(),
                "Value cannot be empty",
            );
        }
        if !self.server.cors_origin.is_empty()
            && !self.server.cors_origin.starts_with("http://")
            && !self.server.cors_origin.starts_with("https://")
        {
            error(
                "server.cors_origin",
                self.server.cors_origin.clone(),
                "Origin must start with http:// or https://",
            );
        }
        match SameSitePolicy::parse(&self.server.cookie_same_site) {
            Some(SameSitePolicy::None) if !self.server.cookie_secure => {
                error(
                    "server.cookie_secure",
                    self.server.cookie_secure.to_string(),
                    "SameSite=None cookies require the Secure attribute",
                );
            }
            Some(_) => {}
            None => {
                error(
                    "server.cookie_same_site",
                    self.server.cookie_same_site.clone(),
                    "Must be one of: strict, lax, none",
                );
            }
        }

        if self.auth.jwt_secret.is_empty() {
            error(
                "auth.jwt_secret",
                String::new(),
                &format!("Secret is required; set it in the file or via {}", JWT_SECRET_ENV),
            );
        } else if self.auth.jwt_secret.len() < 32 {
            error(
                "auth.jwt_secret",
                format!("{} bytes", self.auth.jwt_secret.len()),
                "Secret must be at least 32 bytes",
            );
        }
        if self.auth.token_ttl_days <= 0 {
            error(
                "auth.token_ttl_days",
                self.auth.token_ttl_days.to_string(),
                "Value must be positive",
            );
        }
        if self.auth.verify_otp_ttl_hours <= 0 {
            error(
                "auth.verify_otp_ttl_hours",
                self.auth.verify_otp_ttl_hours.to_string(),
                "Value must be positive",
            );
        }
        if self.auth.reset_otp_ttl_minutes <= 0 {
            error(
                "auth.reset_otp_ttl_minutes",
                self.auth.reset_otp_ttl_minutes.to_string(),
                "Value must be positive",
            );
        }

        match self.storage.backend.as_str() {
            "file" => {
                if self.storage.path.as_os_str().is_empty() {
                    error(
                        "storage.path",
                        String::new(),
                        "Path is required for the file backend",
                    );
                }
            }
            "memory" => {}
            other => {
                error(
                    "storage.backend",
                    other.to_string(),
                    "Must be one of: file, memory",
                );
            }
        }

        if self.smtp.enabled {
            if self.smtp.relay.trim().is_empty() {
                error(
                    "smtp.relay",
                    self.smtp.relay.clone(),
                    "Relay host is required when SMTP is enabled",
                );
            }
            if self.smtp.from.trim().is_empty() {
                error(
                    "smtp.from",
                    self.smtp.from.clone(),
                    "From address is required when SMTP is enabled",
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Template written by `postern init`
pub fn default_config_toml() -> String {
    r#"# postern configuration

[server]
bind_addr = "127.0.0.1"
port = 4000
# Browser origin allowed to send credentialed requests.
# Leave empty for same-origin deployments.
cors_origin = "http://localhost:3000"
cookie_secure = false
# strict, lax, or none (none requires cookie_secure = true)
cookie_same_site = "strict"

[auth]
# Required. At least 32 bytes. Prefer the POSTERN_JWT_SECRET
# environment variable over writing the secret here.
jwt_secret = ""
token_ttl_days = 7
verify_otp_ttl_hours = 24
reset_otp_ttl_minutes = 15

[storage]
# "file" persists accounts to a JSON file; "memory" keeps them
# only for the lifetime of the process.
backend = "file"
path = "./postern-data/accounts.json"

[smtp]
# When disabled, outbound email is written to the log instead.
enabled = false
relay = ""
# port = 465
username = ""
# Prefer the POSTERN_SMTP_PASSWORD environment variable.
password = ""
from = ""
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        config
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = Config::parse("", Path::new("test.toml")).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.storage.backend, "file");
        assert!(!config.smtp.enabled);
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let content = r#"
            [server]
            port = 8080

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            token_ttl_days = 1
        "#;
        let config = Config::parse(content, Path::new("test.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.auth.token_ttl_days, 1);
        assert_eq!(config.auth.verify_otp_ttl_hours, 24);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let err = Config::parse("[server\nport = ", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_template_parses_and_only_lacks_secret() {
        let config = Config::parse(&default_config_toml(), Path::new("postern.toml")).unwrap();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "auth.jwt_secret");
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = valid_config();
        config.server.port = 0;
        config.server.cookie_same_site = "sometimes".to_string();
        config.storage.backend = "postgres".to_string();

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"server.port"));
        assert!(fields.contains(&"server.cookie_same_site"));
        assert!(fields.contains(&"storage.backend"));
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let mut config = valid_config();
        config.auth.jwt_secret = "too-short".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "auth.jwt_secret");
    }

    #[test]
    fn test_smtp_fields_required_when_enabled() {
        let mut config = valid_config();
        config.smtp.enabled = true;
        let errors = config.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"smtp.relay"));
        assert!(fields.contains(&"smtp.from"));
    }

    #[test]
    fn test_same_site_none_requires_secure_cookies() {
        let mut config = valid_config();
        config.server.cookie_same_site = "none".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "server.cookie_secure");

        config.server.cookie_secure = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_cors_origin_is_rejected() {
        let mut config = valid_config();
        config.server.cors_origin = "localhost:3000".to_string();
        let errors = config.validate().unwrap_err();
        assert_eq!(errors[0].field, "server.cors_origin");

        config.server.cors_origin = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_takes_precedence() {
        std::env::set_var(JWT_SECRET_ENV, "env-secret-0123456789abcdef012345");
        let mut config = Config::default();
        config.auth.jwt_secret = "file-secret".to_string();
        config.apply_env_overrides();
        std::env::remove_var(JWT_SECRET_ENV);

        assert_eq!(config.auth.jwt_secret, "env-secret-0123456789abcdef012345");
    }
}
