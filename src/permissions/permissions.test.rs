//! Tests for the capability checks.

use super::*;

const ALL_ROLES: [Role; 5] = [
    Role::General,
    Role::Leader,
    Role::Manager,
    Role::Director,
    Role::Executive,
];

fn uid(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

#[test]
fn has_permission_matches_rank_order() {
    for a in ALL_ROLES {
        for b in ALL_ROLES {
            assert_eq!(has_permission(a, b), a.rank() >= b.rank());
        }
    }
}

#[test]
fn has_permission_is_reflexive() {
    for role in ALL_ROLES {
        assert!(has_permission(role, role));
    }
}

#[test]
fn has_permission_is_antisymmetric_on_strict_rank() {
    for a in ALL_ROLES {
        for b in ALL_ROLES {
            if a.rank() > b.rank() {
                assert!(has_permission(a, b));
                assert!(!has_permission(b, a));
            }
        }
    }
}

#[test]
fn unknown_role_strings_rank_below_everything() {
    assert_eq!(role_rank("INTERN"), -1);
    assert_eq!(role_rank(""), -1);
    assert_eq!(role_rank("GENERAL"), 0);
    assert_eq!(role_rank("EXECUTIVE"), 4);
}

#[test]
fn everyone_can_view_themselves() {
    for role in ALL_ROLES {
        assert!(can_view_user(role, uid(1), uid(1), Some(uid(9)), None));
    }
}

#[test]
fn general_cannot_view_anyone_else() {
    assert!(!can_view_user(
        Role::General,
        uid(1),
        uid(2),
        Some(uid(9)),
        Some(uid(9))
    ));
}

#[test]
fn leader_sees_own_department_and_unassigned_targets() {
    let dept = uid(9);
    assert!(can_view_user(Role::Leader, uid(1), uid(2), Some(dept), Some(dept)));
    assert!(!can_view_user(
        Role::Leader,
        uid(1),
        uid(2),
        Some(uid(8)),
        Some(dept)
    ));
    // A target with no department stays visible to supervisors.
    assert!(can_view_user(Role::Leader, uid(1), uid(2), None, Some(dept)));
}

#[test]
fn director_and_executive_see_everyone() {
    assert!(can_view_user(Role::Director, uid(1), uid(2), Some(uid(8)), None));
    assert!(can_view_user(Role::Executive, uid(1), uid(2), None, None));
}

#[test]
fn edit_requires_strictly_higher_rank() {
    for editor in ALL_ROLES {
        for target in ALL_ROLES {
            if editor.rank() <= target.rank() {
                assert!(!can_edit_user(editor, uid(1), uid(2), target));
            } else {
                assert!(can_edit_user(editor, uid(1), uid(2), target));
            }
        }
    }
}

#[test]
fn self_edit_is_always_allowed() {
    assert!(can_edit_user(Role::General, uid(1), uid(1), Role::General));
}

#[test]
fn equal_rank_is_never_deletable() {
    assert!(!can_delete_user(Role::Director, Role::Director));
    assert!(!can_delete_user(Role::Executive, Role::Executive));
}

#[test]
fn delete_needs_director_and_seniority() {
    assert!(can_delete_user(Role::Executive, Role::Manager));
    assert!(can_delete_user(Role::Director, Role::Manager));
    assert!(!can_delete_user(Role::Manager, Role::General));
    assert!(!can_delete_user(Role::Director, Role::Executive));
}

#[test]
fn role_change_is_executive_only_and_bounded() {
    assert!(can_change_role(Role::Executive, Role::Manager, Role::Director));
    assert!(can_change_role(Role::Executive, Role::General, Role::Executive));
    // Cannot touch another executive.
    assert!(!can_change_role(Role::Executive, Role::Executive, Role::General));
    assert!(!can_change_role(Role::Director, Role::Manager, Role::Leader));
}

#[test]
fn owned_resources_open_to_owner_and_managers() {
    assert!(can_access_owned(Role::General, uid(1), uid(1)));
    assert!(!can_access_owned(Role::Leader, uid(1), uid(2)));
    assert!(can_access_owned(Role::Manager, uid(1), uid(2)));
    assert!(can_access_owned(Role::Executive, uid(1), uid(2)));
}

#[test]
fn approval_excludes_the_owner() {
    assert!(can_approve_goal(Role::Manager, uid(1), uid(2)));
    assert!(!can_approve_goal(Role::Manager, uid(1), uid(1)));
    assert!(!can_approve_goal(Role::Leader, uid(1), uid(2)));
}

#[test]
fn supervisor_seat_requires_leader_or_above() {
    assert!(!can_supervise(Role::General));
    for role in [Role::Leader, Role::Manager, Role::Director, Role::Executive] {
        assert!(can_supervise(role));
    }
}

#[test]
fn predicates_are_idempotent() {
    let first = can_view_user(Role::Leader, uid(1), uid(2), None, Some(uid(9)));
    let second = can_view_user(Role::Leader, uid(1), uid(2), None, Some(uid(9)));
    assert_eq!(first, second);
}
