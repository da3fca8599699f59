//! # JSON File Store
//!
//! Single-file account store: the whole account set lives in memory and
//! every mutation rewrites the file through a temp-file rename, so a crash
//! mid-write leaves the previous snapshot intact. A failed rewrite rolls
//! the in-memory set back, so reads never see state the file does not hold.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::account::{Account, AccountRepository};
use crate::auth::errors::{AuthError, AuthResult};

/// File-backed account repository
pub struct JsonFileAccountRepository {
    path: PathBuf,
    accounts: RwLock<Vec<Account>>,
}

impl JsonFileAccountRepository {
    /// Create a repository backed by `path`. Call [`bootstrap`] before use.
    ///
    /// [`bootstrap`]: AccountRepository::bootstrap
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            accounts: RwLock::new(Vec::new()),
        }
    }

    /// Rewrite the backing file from the given snapshot.
    ///
    /// Callers hold the write lock, so flushes never interleave.
    async fn flush(&self, accounts: &[Account]) -> AuthResult<()> {
        let content = serde_json::to_string_pretty(accounts)
            .map_err(|e| AuthError::Store(format!("Failed to serialize accounts: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &content).await.map_err(|e| {
            AuthError::Store(format!("Failed to write {}: {}", tmp.display(), e))
        })?;

        // fsync before the rename so the new snapshot is durable
        let file = tokio::fs::File::open(&tmp).await.map_err(|e| {
            AuthError::Store(format!("Failed to open {} for fsync: {}", tmp.display(), e))
        })?;
        file.sync_all()
            .await
            .map_err(|e| AuthError::Store(format!("Failed to fsync {}: {}", tmp.display(), e)))?;

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            AuthError::Store(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for JsonFileAccountRepository {
    async fn bootstrap(&self) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    AuthError::Store(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let mut accounts = self.accounts.write().await;
        if self.path.exists() {
            let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                AuthError::Store(format!("Failed to read {}: {}", self.path.display(), e))
            })?;
            *accounts = serde_json::from_str(&content).map_err(|e| {
                AuthError::Store(format!("Failed to parse {}: {}", self.path.display(), e))
            })?;
            tracing::info!(
                path = %self.path.display(),
                accounts = accounts.len(),
                "account store loaded"
            );
        } else {
            self.flush(&accounts).await?;
            tracing::info!(path = %self.path.display(), "account store created");
        }
        Ok(())
    }

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
        // Roll back so the cache never runs ahead of the file
        if let Err(e) = self.flush(&accounts).await {
            accounts.pop();
            return Err(e);
        }
        Ok(account)
    }

    async fn save(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.accounts.write().await;
        let index = accounts
            .iter()
            .position(|a| a.id == account.id)
            .ok_or(AuthError::NotFound)?;

        let previous = std::mem::replace(&mut accounts[index], account.clone());
        if let Err(e) = self.flush(&accounts).await {
            accounts[index] = previous;
            return Err(e);
        }
        Ok(())
    }

    async fn list(&self) -> AuthResult<Vec<Account>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account::OtpChallenge;
    use chrono::Duration;

    fn test_account(email: &str) -> Account {
        Account::new("Test User", email, "$argon2id$test".to_string())
    }

    #[tokio::test]
    async fn test_bootstrap_creates_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let repo = JsonFileAccountRepository::new(&path);
        repo.bootstrap().await.unwrap();

        assert!(path.exists());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/accounts.json");

        let repo = JsonFileAccountRepository::new(&path);
        repo.bootstrap().await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_accounts_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let repo = JsonFileAccountRepository::new(&path);
        repo.bootstrap().await.unwrap();
        let created = repo.create(test_account("a@example.com")).await.unwrap();

        // Fresh instance over the same file
        let reloaded = JsonFileAccountRepository::new(&path);
        reloaded.bootstrap().await.unwrap();

        let found = reloaded.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.password_hash, created.password_hash);
    }

    #[tokio::test]
    async fn test_save_persists_challenge_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let repo = JsonFileAccountRepository::new(&path);
        repo.bootstrap().await.unwrap();
        let mut account = repo.create(test_account("a@example.com")).await.unwrap();

        account.verify_challenge =
            Some(OtpChallenge::new("042042".to_string(), Duration::hours(24)));
        repo.save(&account).await.unwrap();

        let reloaded = JsonFileAccountRepository::new(&path);
        reloaded.bootstrap().await.unwrap();
        let stored = reloaded.find_by_id(account.id).await.unwrap().unwrap();
        assert_eq!(stored.verify_challenge.unwrap().code, "042042");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let repo = JsonFileAccountRepository::new(&path);
        repo.bootstrap().await.unwrap();
        repo.create(test_account("a@example.com")).await.unwrap();

        let err = repo.create(test_account("a@example.com")).await.unwrap_err();
        assert_eq!(err, AuthError::DuplicateEmail);
    }

    #[tokio::test]
    async fn test_corrupted_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        tokio::fs::write(&path, "{ not json ]").await.unwrap();

        let repo = JsonFileAccountRepository::new(&path);
        let err = repo.bootstrap().await.unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[tokio::test]
    async fn test_failed_flush_rolls_back_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store/accounts.json");

        let repo = JsonFileAccountRepository::new(&path);
        repo.bootstrap().await.unwrap();

        // Removing the directory makes the next flush fail
        tokio::fs::remove_dir_all(dir.path().join("store"))
            .await
            .unwrap();

        let err = repo.create(test_account("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));

        // The rejected account must not be readable afterwards
        assert!(repo
            .find_by_email("a@example.com")
            .await
            .unwrap()
            .is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_flush_restores_previous_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store/accounts.json");

        let repo = JsonFileAccountRepository::new(&path);
        repo.bootstrap().await.unwrap();
        let mut account = repo.create(test_account("a@example.com")).await.unwrap();

        tokio::fs::remove_dir_all(dir.path().join("store"))
            .await
            .unwrap();

        account.is_verified = true;
        let err = repo.save(&account).await.unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));

        let stored = repo.find_by_id(account.id).await.unwrap().unwrap();
        assert!(!stored.is_verified);
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let repo = JsonFileAccountRepository::new(&path);
        repo.bootstrap().await.unwrap();
        repo.create(test_account("a@example.com")).await.unwrap();

        assert!(!path.with_extension("json.tmp").exists());
    }
}
