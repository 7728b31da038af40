//! Authorization decisions for shared accounts.
//!
//! Every permission check in the system goes through [`authorize`]. Callers
//! resolve the actor's [`Membership`] first; a missing membership row is a
//! normal outcome and is denied here rather than treated as an error.

use uuid::Uuid;

use super::role::Role;

/// An operation on an account or one of its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read account details.
    ViewAccount,
    /// List account members.
    ListMembers,
    /// Delete the account with all members and transactions.
    DeleteAccount,
    /// Add a user to the account.
    InviteMember,
    /// Change a member's role.
    ChangeRole,
    /// Remove a member from the account.
    RemoveMember,
    /// Create a transaction or periodic series.
    CreateTransaction,
    /// List transactions.
    ListTransactions,
    /// Edit a single transaction.
    UpdateTransaction,
    /// Delete a single transaction.
    DeleteTransaction,
}

impl Action {
    /// All actions.
    pub const ALL: [Self; 10] = [
        Self::ViewAccount,
        Self::ListMembers,
        Self::DeleteAccount,
        Self::InviteMember,
        Self::ChangeRole,
        Self::RemoveMember,
        Self::CreateTransaction,
        Self::ListTransactions,
        Self::UpdateTransaction,
        Self::DeleteTransaction,
    ];

    /// Lowest role allowed to perform the action.
    ///
    /// For transaction edits the answer depends on whether the actor created
    /// the transaction.
    #[must_use]
    pub const fn required_role(self, actor_owns_resource: bool) -> Role {
        match self {
            Self::ViewAccount | Self::ListMembers | Self::ListTransactions => Role::Viewer,
            Self::CreateTransaction => Role::Editor,
            Self::UpdateTransaction | Self::DeleteTransaction => {
                if actor_owns_resource {
                    Role::Editor
                } else {
                    Role::Admin
                }
            }
            Self::DeleteAccount | Self::InviteMember | Self::ChangeRole | Self::RemoveMember => {
                Role::Owner
            }
        }
    }
}

/// The actor's standing in an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// The actor is a member with the given role.
    Member(Role),
    /// The actor has no membership row, or the account does not exist.
    NotAMember,
}

impl Membership {
    /// Returns the role, if any.
    #[must_use]
    pub const fn role(self) -> Option<Role> {
        match self {
            Self::Member(role) => Some(role),
            Self::NotAMember => None,
        }
    }
}

impl From<Option<Role>> for Membership {
    fn from(role: Option<Role>) -> Self {
        role.map_or(Self::NotAMember, Self::Member)
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed.
    Allow,
    /// The action is forbidden.
    Deny,
}

impl Decision {
    /// Returns true for `Allow`.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether `actor_id` may perform `action`.
///
/// `resource_owner` is the creator of the transaction for update and delete.
/// An unknown creator counts as someone else.
#[must_use]
pub fn authorize(
    membership: Membership,
    actor_id: Uuid,
    action: Action,
    resource_owner: Option<Uuid>,
) -> Decision {
    let Membership::Member(role) = membership else {
        return Decision::Deny;
    };

    let actor_owns_resource = resource_owner == Some(actor_id);
    if role >= action.required_role(actor_owns_resource) {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// Decides whether a membership with `target_role` may be changed or removed.
///
/// The owner's membership is fixed for the lifetime of the account.
#[must_use]
pub const fn may_modify_membership(target_role: Role) -> Decision {
    match target_role {
        Role::Owner => Decision::Deny,
        Role::Viewer | Role::Editor | Role::Admin => Decision::Allow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Role::Viewer, Action::ViewAccount, Decision::Allow)]
    #[case(Role::Viewer, Action::ListTransactions, Decision::Allow)]
    #[case(Role::Viewer, Action::CreateTransaction, Decision::Deny)]
    #[case(Role::Editor, Action::CreateTransaction, Decision::Allow)]
    #[case(Role::Editor, Action::InviteMember, Decision::Deny)]
    #[case(Role::Admin, Action::ListMembers, Decision::Allow)]
    #[case(Role::Admin, Action::ChangeRole, Decision::Deny)]
    #[case(Role::Admin, Action::DeleteAccount, Decision::Deny)]
    #[case(Role::Owner, Action::RemoveMember, Decision::Allow)]
    #[case(Role::Owner, Action::DeleteAccount, Decision::Allow)]
    fn test_account_actions(#[case] role: Role, #[case] action: Action, #[case] expected: Decision) {
        let actor = Uuid::new_v4();
        assert_eq!(authorize(Membership::Member(role), actor, action, None), expected);
    }

    #[rstest]
    #[case(Role::Viewer, true, Decision::Deny)]
    #[case(Role::Viewer, false, Decision::Deny)]
    #[case(Role::Editor, true, Decision::Allow)]
    #[case(Role::Editor, false, Decision::Deny)]
    #[case(Role::Admin, true, Decision::Allow)]
    #[case(Role::Admin, false, Decision::Allow)]
    #[case(Role::Owner, false, Decision::Allow)]
    fn test_transaction_edits(
        #[case] role: Role,
        #[case] own: bool,
        #[case] expected: Decision,
    ) {
        let actor = Uuid::new_v4();
        let owner = if own { actor } else { Uuid::new_v4() };

        for action in [Action::UpdateTransaction, Action::DeleteTransaction] {
            assert_eq!(
                authorize(Membership::Member(role), actor, action, Some(owner)),
                expected
            );
        }
    }

    #[test]
    fn test_unknown_resource_owner_counts_as_other() {
        let actor = Uuid::new_v4();
        let decision = authorize(
            Membership::Member(Role::Editor),
            actor,
            Action::DeleteTransaction,
            None,
        );
        assert_eq!(decision, Decision::Deny);
    }

    #[test]
    fn test_non_member_is_always_denied() {
        let actor = Uuid::new_v4();
        for action in Action::ALL {
            assert_eq!(
                authorize(Membership::NotAMember, actor, action, Some(actor)),
                Decision::Deny
            );
        }
    }

    #[test]
    fn test_owner_membership_is_fixed() {
        assert_eq!(may_modify_membership(Role::Owner), Decision::Deny);
        assert_eq!(may_modify_membership(Role::Admin), Decision::Allow);
        assert_eq!(may_modify_membership(Role::Viewer), Decision::Allow);
    }

    #[test]
    fn test_membership_from_option() {
        assert_eq!(Membership::from(None), Membership::NotAMember);
        assert_eq!(
            Membership::from(Some(Role::Admin)),
            Membership::Member(Role::Admin)
        );
    }
}
