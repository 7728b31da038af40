//! Refresh-token lifecycle rules.
//!
//! A stored refresh token is `Active` until it is exchanged (`Consumed`),
//! revoked at logout (`Revoked`) or outlives its expiry (`Expired`). Expiry is
//! never written back; it is derived from the clock each time the token is
//! presented.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Lifecycle state of a stored refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    /// May be exchanged for a new pair.
    Active,
    /// Already exchanged once.
    Consumed,
    /// Revoked by the user.
    Revoked,
    /// Past its expiry time.
    Expired,
}

/// Why a presented refresh token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RefreshRejection {
    /// The token was exchanged before. Presenting it again is a replay.
    #[error("refresh token already used")]
    AlreadyUsed,

    /// Unknown, revoked or expired token.
    #[error("refresh token is invalid")]
    Invalid,
}

/// Derives the state of a stored token at `now`.
///
/// Consumption wins over revocation and expiry so that replays are always
/// reported as such.
#[must_use]
pub fn evaluate(
    is_refreshed: bool,
    revoked_at: Option<DateTime<Utc>>,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> RefreshTokenState {
    if is_refreshed {
        RefreshTokenState::Consumed
    } else if revoked_at.is_some() {
        RefreshTokenState::Revoked
    } else if expires_at <= now {
        RefreshTokenState::Expired
    } else {
        RefreshTokenState::Active
    }
}

impl RefreshTokenState {
    /// Checks that the token may be exchanged.
    ///
    /// # Errors
    ///
    /// Returns `RefreshRejection::AlreadyUsed` for consumed tokens and
    /// `RefreshRejection::Invalid` for revoked or expired ones.
    pub const fn ensure_exchangeable(self) -> Result<(), RefreshRejection> {
        match self {
            Self::Active => Ok(()),
            Self::Consumed => Err(RefreshRejection::AlreadyUsed),
            Self::Revoked | Self::Expired => Err(RefreshRejection::Invalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, 60, RefreshTokenState::Active)]
    #[case(true, false, 60, RefreshTokenState::Consumed)]
    #[case(false, true, 60, RefreshTokenState::Revoked)]
    #[case(false, false, -60, RefreshTokenState::Expired)]
    #[case(true, true, -60, RefreshTokenState::Consumed)]
    #[case(false, true, -60, RefreshTokenState::Revoked)]
    fn test_evaluate(
        #[case] is_refreshed: bool,
        #[case] revoked: bool,
        #[case] expires_in_secs: i64,
        #[case] expected: RefreshTokenState,
    ) {
        let now = Utc::now();
        let revoked_at = revoked.then(|| now - Duration::minutes(1));
        let expires_at = now + Duration::seconds(expires_in_secs);

        assert_eq!(evaluate(is_refreshed, revoked_at, expires_at, now), expected);
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let now = Utc::now();
        assert_eq!(evaluate(false, None, now, now), RefreshTokenState::Expired);
    }

    #[test]
    fn test_ensure_exchangeable() {
        assert_eq!(RefreshTokenState::Active.ensure_exchangeable(), Ok(()));
        assert_eq!(
            RefreshTokenState::Consumed.ensure_exchangeable(),
            Err(RefreshRejection::AlreadyUsed)
        );
        assert_eq!(
            RefreshTokenState::Revoked.ensure_exchangeable(),
            Err(RefreshRejection::Invalid)
        );
        assert_eq!(
            RefreshTokenState::Expired.ensure_exchangeable(),
            Err(RefreshRejection::Invalid)
        );
    }
}
