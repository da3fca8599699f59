//! postern - A strict, self-hostable email/password authentication service
//!
//! Accounts, sessions in signed HttpOnly cookies, email verification and
//! password reset via one-time codes.

pub mod auth;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod storage;
