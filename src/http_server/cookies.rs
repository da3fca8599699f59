//! # Session Cookies
//!
//! The session token travels in one HttpOnly cookie. Everything about
//! that cookie (name, attributes, parsing) lives here so the handlers
//! and the guard cannot drift apart.

use axum::http::{header, HeaderMap};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

/// SameSite attribute values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SameSitePolicy {
    Strict,
    Lax,
    None,
}

impl SameSitePolicy {
    /// Parse a configured policy name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Some(SameSitePolicy::Strict),
            "lax" => Some(SameSitePolicy::Lax),
            "none" => Some(SameSitePolicy::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SameSitePolicy::Strict => "Strict",
            SameSitePolicy::Lax => "Lax",
            SameSitePolicy::None => "None",
        }
    }
}

/// How session cookies are stamped for this deployment
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// Add the Secure attribute (HTTPS-only cookie)
    pub secure: bool,
    pub same_site: SameSitePolicy,
    /// Cookie lifetime; keep aligned with the token TTL
    pub max_age_secs: i64,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: false,
            same_site: SameSitePolicy::Strict,
            max_age_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl CookieSettings {
    /// Set-Cookie value carrying a fresh session token
    pub fn session_cookie(&self, token: &str) -> String {
        self.render(token, self.max_age_secs)
    }

    /// Set-Cookie value that removes the session cookie
    pub fn clear_cookie(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite={}; Path=/; Max-Age={}",
            SESSION_COOKIE,
            value,
            self.same_site.as_str(),
            max_age
        );
        // Browsers refuse SameSite=None without Secure
        if self.secure || self.same_site == SameSitePolicy::None {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Pull the session token out of a request's Cookie header, if present
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let mut parts = pair.trim().splitn(2, '=');
        match (parts.next(), parts.next()) {
            (Some(name), Some(value)) if name == SESSION_COOKIE => Some(value.to_string()),
            _ => None,
        }
    })
}
