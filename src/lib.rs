//! shelf-rs: a personal book library backed by a single SQLite file.
//!
//! Users register and log in, browse a catalogue seeded from saved
//! book-list pages, and keep a list of favorite books.
//!
//! # Features
//!
//! - Generic table operations (insert, search, update, delete, random
//!   sample, counts) with schema-checked identifiers
//! - Typed repositories for users, books and favorites
//! - SHA-256 password hashing and explicit login sessions
//! - Catalogue seeding with (name, author) deduplication
//! - Lock contention reported as an error instead of retried

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Authentication and sessions.
pub mod auth;
/// Configuration and CLI.
pub mod config;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// Catalogue browsing and favorites.
pub mod library;
/// Catalogue seeding.
pub mod seed;


pub use auth::{AuthService, Session};
pub use config::{Cli, Command, Config};
pub use db::Database;
pub use error::{AppError, ConstraintKind, Result};
pub use library::LibraryService;
