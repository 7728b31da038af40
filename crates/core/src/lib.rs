//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//!
//! # Modules
//!
//! - `access` - Member roles and the authorization decision table
//! - `auth` - Password hashing
//! - `token` - Refresh-token state evaluation
//! - `periodic` - Recurring transaction expansion
//! - `transaction` - Transaction list filters

pub mod access;
pub mod auth;
pub mod periodic;
pub mod token;
pub mod transaction;
