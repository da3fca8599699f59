//! # Postern Auth Module
//!
//! The credential lifecycle behind the HTTP surface: accounts, password
//! hashing, session tokens, one-time codes, and outbound email.

pub mod account;
pub mod crypto;
pub mod email;
pub mod errors;
pub mod jwt;
pub mod service;

pub use account::{Account, AccountRepository, InMemoryAccountRepository, OtpChallenge};
pub use email::{EmailSender, EmailTemplate, LogEmailSender, SmtpEmailSender};
pub use errors::{AuthError, AuthResult};
pub use jwt::{SessionClaims, SessionTokens};
pub use service::{AuthConfig, AuthService, Profile};
