//! # Auth Errors
//!
//! Every failure in the credential lifecycle maps to exactly one variant,
//! and every variant maps to exactly one HTTP status and stable error code.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth errors
///
/// `InvalidCredentials` deliberately carries no detail: a wrong password
/// and an unknown email must be indistinguishable to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("Missing required field: {0}")]
    MissingInput(&'static str),

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Account not found")]
    NotFound,

    #[error("Account is already verified")]
    AlreadyVerified,

    #[error("Invalid one-time code")]
    InvalidOtp,

    #[error("One-time code has expired")]
    OtpExpired,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Email dispatch error: {0}")]
    Notify(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingInput(_) => 400,
            AuthError::DuplicateEmail => 409,
            AuthError::InvalidCredentials => 401,
            AuthError::Unauthenticated => 401,
            AuthError::NotFound => 404,
            AuthError::AlreadyVerified => 409,
            AuthError::InvalidOtp => 400,
            AuthError::OtpExpired => 410,
            AuthError::Store(_) => 500,
            AuthError::Crypto(_) => 500,
            AuthError::Notify(_) => 502,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingInput(_) => "MISSING_INPUT",
            AuthError::DuplicateEmail => "DUPLICATE_EMAIL",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::AlreadyVerified => "ALREADY_VERIFIED",
            AuthError::InvalidOtp => "INVALID_OTP",
            AuthError::OtpExpired => "OTP_EXPIRED",
            AuthError::Store(_) => "STORE_ERROR",
            AuthError::Crypto(_) => "CRYPTO_ERROR",
            AuthError::Notify(_) => "NOTIFY_ERROR",
        }
    }
}
