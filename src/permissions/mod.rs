//! Capability checks shared by every handler.
//!
//! All user/resource authorization lives here so the per-resource routes
//! never carry their own inline role comparisons. Every function is pure:
//! same inputs, same answer, no I/O.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(test)]
#[path = "permissions.test.rs"]
mod permissions_test;

/// Organizational roles, ordered from least to most senior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    General,
    Leader,
    Manager,
    Director,
    Executive,
}

impl Role {
    pub fn rank(self) -> i32 {
        match self {
            Role::General => 0,
            Role::Leader => 1,
            Role::Manager => 2,
            Role::Director => 3,
            Role::Executive => 4,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GENERAL" => Some(Role::General),
            "LEADER" => Some(Role::Leader),
            "MANAGER" => Some(Role::Manager),
            "DIRECTOR" => Some(Role::Director),
            "EXECUTIVE" => Some(Role::Executive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::General => "GENERAL",
            Role::Leader => "LEADER",
            Role::Manager => "MANAGER",
            Role::Director => "DIRECTOR",
            Role::Executive => "EXECUTIVE",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Role::General => "General",
            Role::Leader => "Leader",
            Role::Manager => "Manager",
            Role::Director => "Director",
            Role::Executive => "Executive",
        }
    }
}

/// Rank of a raw role string; unknown strings rank below every real role so
/// they fail every seniority comparison.
pub fn role_rank(value: &str) -> i32 {
    Role::parse(value).map_or(-1, Role::rank)
}

/// True when `user` is at least as senior as `required`.
pub fn has_permission(user: Role, required: Role) -> bool {
    user.rank() >= required.rank()
}

/// Whether `viewer` may see `target`'s profile. A user always sees their
/// own. LEADER and MANAGER see their own department; a target without a
/// department stays visible to them (the original system treats
/// unassigned people as company-wide). DIRECTOR and above see everyone.
pub fn can_view_user(
    viewer: Role,
    viewer_id: Uuid,
    target_id: Uuid,
    target_department: Option<Uuid>,
    viewer_department: Option<Uuid>,
) -> bool {
    if viewer_id == target_id {
        return true;
    }
    match viewer {
        Role::General => false,
        Role::Leader | Role::Manager => match target_department {
            Some(dept) => viewer_department == Some(dept),
            None => true,
        },
        Role::Director | Role::Executive => true,
    }
}

/// Self-edit is always allowed (the caller must separately refuse a self
/// role-change); editing anyone else requires strictly higher rank.
pub fn can_edit_user(editor: Role, editor_id: Uuid, target_id: Uuid, target: Role) -> bool {
    if editor_id == target_id {
        return true;
    }
    editor.rank() > target.rank()
}

/// Deleting requires DIRECTOR or above and strictly higher rank than the
/// target; equals can never delete each other. Self-delete is refused by
/// the caller before this check.
pub fn can_delete_user(deleter: Role, target: Role) -> bool {
    has_permission(deleter, Role::Director) && deleter.rank() > target.rank()
}

/// Role changes are EXECUTIVE territory, only downward, and never grant a
/// role senior to the changer's own.
pub fn can_change_role(changer: Role, target: Role, new_role: Role) -> bool {
    has_permission(changer, Role::Executive)
        && changer.rank() > target.rank()
        && changer.rank() >= new_role.rank()
}

/// Owned resources (goals, next-action listings) are visible to their owner
/// and to MANAGER and above.
pub fn can_access_owned(viewer: Role, viewer_id: Uuid, owner_id: Uuid) -> bool {
    viewer_id == owner_id || has_permission(viewer, Role::Manager)
}

/// Participant test for a one-on-one and everything hanging off it.
pub fn is_participant(user_id: Uuid, supervisor_id: Uuid, member_id: Uuid) -> bool {
    user_id == supervisor_id || user_id == member_id
}

/// Approval of a pending goal: MANAGER and above, never the goal's owner.
pub fn can_approve_goal(approver: Role, approver_id: Uuid, owner_id: Uuid) -> bool {
    has_permission(approver, Role::Manager) && approver_id != owner_id
}

/// Whether a user may take the supervisor seat in a one-on-one.
pub fn can_supervise(role: Role) -> bool {
    has_permission(role, Role::Leader)
}
