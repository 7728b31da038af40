//! Property-based tests for the authorization decision table.

use proptest::prelude::*;
use uuid::Uuid;

use super::policy::{Action, Decision, Membership, authorize};
use super::role::Role;

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Viewer),
        Just(Role::Editor),
        Just(Role::Admin),
        Just(Role::Owner),
    ]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    proptest::sample::select(Action::ALL.to_vec())
}

fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

/// Reference table written out cell by cell.
fn expected(role: Role, action: Action, actor_owns_resource: bool) -> Decision {
    use Action::{
        ChangeRole, CreateTransaction, DeleteAccount, DeleteTransaction, InviteMember,
        ListMembers, ListTransactions, RemoveMember, UpdateTransaction, ViewAccount,
    };
    use Role::{Admin, Editor, Owner, Viewer};

    let allow = match (action, role) {
        (ViewAccount | ListMembers | ListTransactions, _) => true,
        (CreateTransaction, Editor | Admin | Owner) => true,
        (UpdateTransaction | DeleteTransaction, Admin | Owner) => true,
        (UpdateTransaction | DeleteTransaction, Editor) => actor_owns_resource,
        (InviteMember | ChangeRole | RemoveMember | DeleteAccount, Owner) => true,
        (CreateTransaction | UpdateTransaction | DeleteTransaction, Viewer)
        | (InviteMember | ChangeRole | RemoveMember | DeleteAccount, Viewer | Editor | Admin) => {
            false
        }
    };

    if allow { Decision::Allow } else { Decision::Deny }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every (role, action, ownership) cell matches the reference table.
    #[test]
    fn prop_matches_reference_table(
        role in role_strategy(),
        action in action_strategy(),
        actor in uuid_strategy(),
        other in uuid_strategy(),
        own in any::<bool>(),
    ) {
        prop_assume!(actor != other);
        let resource_owner = Some(if own { actor } else { other });

        let decision = authorize(Membership::Member(role), actor, action, resource_owner);

        prop_assert_eq!(decision, expected(role, action, own));
    }

    /// Raising a member's role never turns an allow into a deny.
    #[test]
    fn prop_monotonic_in_role(
        low in role_strategy(),
        high in role_strategy(),
        action in action_strategy(),
        actor in uuid_strategy(),
        resource_owner in proptest::option::of(uuid_strategy()),
    ) {
        prop_assume!(low <= high);

        let low_decision = authorize(Membership::Member(low), actor, action, resource_owner);
        let high_decision = authorize(Membership::Member(high), actor, action, resource_owner);

        prop_assert!(!low_decision.is_allowed() || high_decision.is_allowed());
    }

    /// Non-members are denied regardless of the action or resource owner.
    #[test]
    fn prop_non_member_denied(
        action in action_strategy(),
        actor in uuid_strategy(),
        resource_owner in proptest::option::of(uuid_strategy()),
    ) {
        prop_assert_eq!(
            authorize(Membership::NotAMember, actor, action, resource_owner),
            Decision::Deny
        );
    }
}
