//! Account membership roles and authorization decisions.
//!
//! # Modules
//!
//! - `role` - Member roles and their wire representation
//! - `policy` - The action/role decision table

pub mod policy;
pub mod role;

#[cfg(test)]
mod policy_props;

pub use policy::{Action, Decision, Membership, authorize, may_modify_membership};
pub use role::{Role, RoleParseError};
