//! Member roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a member within an account.
///
/// Variants are declared in order of increasing privilege, so `Ord` compares
/// privilege directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access.
    Viewer,
    /// Can create transactions and edit their own.
    Editor,
    /// Can edit and delete any transaction.
    Admin,
    /// Manages members and may delete the account. Exactly one per account.
    Owner,
}

/// Errors raised when parsing a role from user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleParseError {
    /// The string is not a known role.
    #[error("unknown role: {0}")]
    Unknown(String),

    /// `owner` cannot be granted through member management.
    #[error("the owner role cannot be assigned")]
    OwnerNotAssignable,
}

impl Role {
    /// All roles, lowest privilege first.
    pub const ALL: [Self; 4] = [Self::Viewer, Self::Editor, Self::Admin, Self::Owner];

    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Editor => "editor",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Parses a role that may be granted by invitation or role change.
    ///
    /// # Errors
    ///
    /// Returns `RoleParseError::OwnerNotAssignable` for `owner` and
    /// `RoleParseError::Unknown` for anything that is not a role.
    pub fn parse_assignable(s: &str) -> Result<Self, RoleParseError> {
        match s.parse()? {
            Self::Owner => Err(RoleParseError::OwnerNotAssignable),
            role => Ok(role),
        }
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(Self::Viewer),
            "editor" => Ok(Self::Editor),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            other => Err(RoleParseError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
