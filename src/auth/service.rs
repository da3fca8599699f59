//! # Auth Service
//!
//! The credential lifecycle: registration, login, session checks, email
//! verification, and password reset. All store access goes through the
//! repository seam and all hashing runs on blocking worker threads.

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::account::{Account, AccountRepository, OtpChallenge};
use super::crypto;
use super::email::{self, EmailSender, EmailTemplate};
use super::errors::{AuthError, AuthResult};
use super::jwt::SessionTokens;

// ==================
// Configuration
// ==================

/// Auth service knobs
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of an email-verification code
    pub verify_otp_ttl_hours: i64,
    /// Lifetime of a password-reset code
    pub reset_otp_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            verify_otp_ttl_hours: 24,
            reset_otp_ttl_minutes: 15,
        }
    }
}

// ==================
// Views
// ==================

/// What an account's owner may see about it
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub is_verified: bool,
}

// ==================
// Auth Service
// ==================

/// Email/password authentication service
pub struct AuthService {
    repo: Arc<dyn AccountRepository>,
    mailer: Arc<dyn EmailSender>,
    tokens: SessionTokens,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        mailer: Arc<dyn EmailSender>,
        tokens: SessionTokens,
        config: AuthConfig,
    ) -> Self {
        Self {
            repo,
            mailer,
            tokens,
            config,
        }
    }

    /// Create an account and log it in.
    ///
    /// The account starts unverified; a welcome email goes out
    /// fire-and-forget once the account is persisted.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<(Account, String)> {
        if name.is_empty() {
            return Err(AuthError::MissingInput("name"));
        }
        if email.is_empty() {
            return Err(AuthError::MissingInput("email"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingInput("password"));
        }

        if self.repo.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;
        // The store re-checks uniqueness under its write lock, closing the
        // window between the lookup above and this insert.
        let account = self.repo.create(Account::new(name, email, password_hash)).await?;
        let token = self.tokens.issue(account.id)?;

        tracing::info!(account_id = %account.id, "account registered");
        email::dispatch(
            self.mailer.clone(),
            account.email.clone(),
            EmailTemplate::Welcome {
                name: account.name.clone(),
                email: account.email.clone(),
            },
        );

        Ok((account, token))
    }

    /// Verify credentials and issue a fresh session token.
    ///
    /// Unknown email and wrong password return the same error, and the
    /// unknown-email path still pays for one hash verification so the two
    /// cannot be told apart by timing.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<(Account, String)> {
        let account = match self.repo.find_by_email(email).await? {
            Some(account) => account,
            None => {
                equalize_blocking(password.to_string()).await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        let matches =
            verify_password_blocking(password.to_string(), account.password_hash.clone()).await?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(account.id)?;
        tracing::info!(account_id = %account.id, "login succeeded");
        Ok((account, token))
    }

    /// Resolve a session token to the account id it is bound to
    pub fn require_session(&self, token: Option<&str>) -> AuthResult<Uuid> {
        match token {
            Some(token) => self.tokens.verify(token),
            None => Err(AuthError::Unauthenticated),
        }
    }

    /// Owner view of an account
    pub async fn get_profile(&self, account_id: Uuid) -> AuthResult<Profile> {
        let account = self
            .repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        Ok(Profile {
            name: account.name,
            is_verified: account.is_verified,
        })
    }

    /// Issue an email-verification code to a logged-in account.
    ///
    /// Re-issuing replaces any outstanding code; only the newest one
    /// counts.
    pub async fn send_verify_otp(&self, account_id: Uuid) -> AuthResult<()> {
        let mut account = self
            .repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        if account.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let code = crypto::generate_otp();
        account.verify_challenge = Some(OtpChallenge::new(
            code.clone(),
            Duration::hours(self.config.verify_otp_ttl_hours),
        ));
        account.touch();
        self.repo.save(&account).await?;

        tracing::info!(account_id = %account.id, "verification code issued");
        email::dispatch(
            self.mailer.clone(),
            account.email.clone(),
            EmailTemplate::VerifyOtp {
                code,
                expires_hours: self.config.verify_otp_ttl_hours,
            },
        );
        Ok(())
    }

    /// Consume a verification code and mark the account verified.
    ///
    /// Expiry is only checked once the code matches, so a wrong guess
    /// never learns whether a live code exists.
    pub async fn verify_email(&self, account_id: Uuid, otp: &str) -> AuthResult<()> {
        if otp.is_empty() {
            return Err(AuthError::MissingInput("otp"));
        }

        let mut account = self
            .repo
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        let challenge = account.verify_challenge.as_ref().ok_or(AuthError::InvalidOtp)?;
        if !challenge.matches(otp) {
            return Err(AuthError::InvalidOtp);
        }
        if challenge.is_expired(Utc::now()) {
            return Err(AuthError::OtpExpired);
        }

        account.is_verified = true;
        account.verify_challenge = None;
        account.touch();
        self.repo.save(&account).await?;

        tracing::info!(account_id = %account.id, "account verified");
        Ok(())
    }

    /// Issue a password-reset code to an email address.
    ///
    /// Public endpoint. `NotFound` for unknown emails reveals whether an
    /// address is registered; the client reset flow depends on that
    /// answer, so it is part of the contract rather than hidden.
    pub async fn send_reset_otp(&self, email: &str) -> AuthResult<()> {
        let mut account = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let code = crypto::generate_otp();
        account.reset_challenge = Some(OtpChallenge::new(
            code.clone(),
            Duration::minutes(self.config.reset_otp_ttl_minutes),
        ));
        account.touch();
        self.repo.save(&account).await?;

        tracing::info!(account_id = %account.id, "reset code issued");
        email::dispatch(
            self.mailer.clone(),
            account.email.clone(),
            EmailTemplate::ResetOtp {
                code,
                expires_minutes: self.config.reset_otp_ttl_minutes,
            },
        );
        Ok(())
    }

    /// Consume a reset code and replace the account's password.
    ///
    /// Requires no session: possession of the emailed code is the proof.
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if email.is_empty() {
            return Err(AuthError::MissingInput("email"));
        }
        if otp.is_empty() {
            return Err(AuthError::MissingInput("otp"));
        }
        if new_password.is_empty() {
            return Err(AuthError::MissingInput("newPassword"));
        }

        let mut account = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let challenge = account.reset_challenge.as_ref().ok_or(AuthError::InvalidOtp)?;
        if !challenge.matches(otp) {
            return Err(AuthError::InvalidOtp);
        }
        if challenge.is_expired(Utc::now()) {
            return Err(AuthError::OtpExpired);
        }

        account.password_hash = hash_password_blocking(new_password.to_string()).await?;
        account.reset_challenge = None;
        account.touch();
        self.repo.save(&account).await?;

        tracing::info!(account_id = %account.id, "password reset");
        Ok(())
    }

    /// Every account in the store
    pub async fn list_accounts(&self) -> AuthResult<Vec<Account>> {
        self.repo.list().await
    }
}

// ==================
// Blocking Helpers
// ==================

/// Argon2 is deliberately slow; keep it off the async worker threads.
async fn hash_password_blocking(password: String) -> AuthResult<String> {
    tokio::task::spawn_blocking(move || crypto::hash_password(&password))
        .await
        .map_err(|e| AuthError::Crypto(format!("Hashing task failed: {}", e)))?
}

async fn verify_password_blocking(password: String, stored_hash: String) -> AuthResult<bool> {
    tokio::task::spawn_blocking(move || crypto::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AuthError::Crypto(format!("Hashing task failed: {}", e)))?
}

async fn equalize_blocking(password: String) {
    let _ = tokio::task::spawn_blocking(move || crypto::equalize_missing_account(&password)).await;
}
