//! # Accounts
//!
//! The account document and the credential-store seam. Transports never
//! touch a store directly; everything goes through [`AccountRepository`].

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::crypto;
use super::errors::{AuthError, AuthResult};

// ==================
// OTP Challenge
// ==================

/// An outstanding one-time code with its deadline.
///
/// Code and deadline live and die together: issuing a new challenge
/// replaces the whole value, consuming one clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpChallenge {
    /// Six ASCII digits, leading zeros preserved
    pub code: String,
    /// Moment the code stops being acceptable
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    pub fn new(code: String, ttl: Duration) -> Self {
        Self {
            code,
            expires_at: Utc::now() + ttl,
        }
    }

    /// Constant-time comparison against a submitted code
    pub fn matches(&self, submitted: &str) -> bool {
        crypto::codes_match(&self.code, submitted)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

// ==================
// Account Document
// ==================

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string; never leaves the service layer
    pub password_hash: String,
    /// Whether the email address has been confirmed via OTP
    pub is_verified: bool,
    /// Outstanding email-verification code, if any
    pub verify_challenge: Option<OtpChallenge>,
    /// Outstanding password-reset code, if any
    pub reset_challenge: Option<OtpChallenge>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: &str, email: &str, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
            is_verified: false,
            verify_challenge: None,
            reset_challenge: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ==================
// Repository Trait
// ==================

/// Storage interface for accounts
///
/// `create` enforces email uniqueness inside the store so that the
/// check-then-insert race cannot produce duplicates.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Prepare the store for use (load or create backing files)
    async fn bootstrap(&self) -> AuthResult<()> {
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>>;

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>>;

    /// Insert a new account; fails with `DuplicateEmail` if the email is taken
    async fn create(&self, account: Account) -> AuthResult<Account>;

    /// Replace the stored document matching `account.id`
    async fn save(&self, account: &Account) -> AuthResult<()>;

    async fn list(&self) -> AuthResult<Vec<Account>>;
}

// ==================
// In-Memory Repository
// ==================

/// In-memory account repository (for testing and ephemeral deployments)
pub struct InMemoryAccountRepository {
    accounts: RwLock<Vec<Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn create(&self, account: Account) -> AuthResult<Account> {
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(AuthError::DuplicateEmail);
        }
        accounts.push(account.clone());
        Ok(account)
    }

    async fn save(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.accounts.write().await;
        match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(stored) => {
                *stored = account.clone();
                Ok(())
            }
            None => Err(AuthError::NotFound),
        }
    }

    async fn list(&self) -> AuthResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.clone())
    }
}
