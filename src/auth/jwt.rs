//! # Session Tokens
//!
//! Self-contained HS256 tokens. The server keeps no session table: the
//! token alone proves a login happened, until it expires or the secret
//! rotates.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};

/// Claims carried inside a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

/// Issues and verifies session tokens for one signing secret
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
        }
    }

    /// Issue a token bound to an account id
    pub fn issue(&self, account_id: Uuid) -> AuthResult<String> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("Token signing failed: {}", e)))
    }

    /// Verify a token and extract the account id it is bound to.
    ///
    /// Expired, tampered, malformed, and wrong-secret tokens all collapse
    /// into `Unauthenticated`; callers never learn which check failed.
    pub fn verify(&self, token: &str) -> AuthResult<Uuid> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::Unauthenticated)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::Unauthenticated)
    }

    /// Token lifetime in whole seconds (cookie Max-Age)
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tokens() -> SessionTokens {
        SessionTokens::new("test-secret-at-least-32-bytes-long!!", 7)
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let tokens = test_tokens();
        let id = Uuid::new_v4();

        let token = tokens.issue(id).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), id);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = test_tokens();
        let now = Utc::now();
        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            iat: (now - Duration::days(8)).timestamp(),
            exp: (now - Duration::days(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-at-least-32-bytes-long!!".as_bytes()),
        )
        .unwrap();

        assert_eq!(tokens.verify(&token).unwrap_err(), AuthError::Unauthenticated);
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let tokens = test_tokens();
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        // Flip one character in the signature segment
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(tokens.verify(&tampered).unwrap_err(), AuthError::Unauthenticated);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let tokens = test_tokens();
        let other = SessionTokens::new("a-completely-different-signing-key!!", 7);

        let token = other.issue(Uuid::new_v4()).unwrap();
        assert_eq!(tokens.verify(&token).unwrap_err(), AuthError::Unauthenticated);
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let tokens = test_tokens();
        assert_eq!(tokens.verify("not.a.token").unwrap_err(), AuthError::Unauthenticated);
        assert_eq!(tokens.verify("").unwrap_err(), AuthError::Unauthenticated);
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let tokens = test_tokens();
        let now = Utc::now();
        let claims = SessionClaims {
            sub: "not-a-uuid".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-at-least-32-bytes-long!!".as_bytes()),
        )
        .unwrap();

        assert_eq!(tokens.verify(&token).unwrap_err(), AuthError::Unauthenticated);
    }

    #[test]
    fn test_ttl_seconds() {
        assert_eq!(test_tokens().ttl_seconds(), 7 * 24 * 60 * 60);
    }
}
