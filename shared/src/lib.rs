//! Shared library for the gestiones back-office
//!
//! This library contains the infrastructure pieces the service binary builds on:
//! - Configuration loaded from the environment
//! - The SQLite connection pool
//! - The error raised while connecting to or probing the database

pub mod config;
pub mod database;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use database::DatabaseService;
pub use error::{AppError, Result};
