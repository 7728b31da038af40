//! Request middleware.

pub mod auth;

pub use auth::{ACCESS_TOKEN_COOKIE, AuthUser, auth_middleware};
