//! # Postern Storage Module
//!
//! Durable account stores behind the `AccountRepository` seam. The
//! in-memory store lives next to the trait; this module holds the
//! backends that survive a restart.

pub mod json_file;

pub use json_file::JsonFileAccountRepository;
