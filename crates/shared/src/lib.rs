//! Shared errors, auth payloads, token codec and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - JWT access-token codec
//! - Auth request/response payloads
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;


pub use auth::{Claims, TokenPair};
pub use config::AppConfig;
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
