//! End-to-end checks of the decision core: role hierarchy, availability
//! flags and next-action aggregation, exercised through the public crate
//! API the handlers use.

use chrono::{Duration, Utc};
use uuid::Uuid;

use mentorserver::goals::goal_progress;
use mentorserver::next_actions::{next_action_stats, sort_for_display, NextActionStatus};
use mentorserver::one_on_ones::{available_actions, OneOnOneStatus};
use mentorserver::permissions::{
    can_change_role, can_delete_user, can_edit_user, can_view_user, has_permission, Role,
};
use mentorserver::shared::models::{KeyResult, NextAction};

fn key_result(current: f64, target: f64) -> KeyResult {
    let now = Utc::now();
    KeyResult {
        id: Uuid::new_v4(),
        goal_id: Uuid::new_v4(),
        title: "kr".into(),
        target_value: target,
        current_value: current,
        unit: "count".into(),
        created_at: now,
        updated_at: now,
    }
}

fn next_action(status: NextActionStatus, due: chrono::DateTime<Utc>) -> NextAction {
    let now = Utc::now();
    NextAction {
        id: Uuid::new_v4(),
        one_on_one_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        title: "follow up".into(),
        description: String::new(),
        due_date: due,
        status: status.as_str().into(),
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn role_hierarchy_is_a_total_order() {
    let roles = [
        Role::General,
        Role::Leader,
        Role::Manager,
        Role::Director,
        Role::Executive,
    ];
    for (i, a) in roles.iter().enumerate() {
        for (j, b) in roles.iter().enumerate() {
            assert_eq!(has_permission(*a, *b), i >= j);
        }
    }
}

#[test]
fn user_capabilities_follow_seniority() {
    let me = Uuid::new_v4();
    let other = Uuid::new_v4();

    // Editing an equal or senior is refused for everyone but yourself.
    assert!(!can_edit_user(Role::Manager, me, other, Role::Manager));
    assert!(!can_edit_user(Role::Manager, me, other, Role::Director));
    assert!(can_edit_user(Role::Manager, me, me, Role::Manager));

    assert!(!can_delete_user(Role::Director, Role::Director));
    assert!(can_delete_user(Role::Executive, Role::Manager));

    // Role changes stop at the changer's own rank and below.
    assert!(can_change_role(Role::Executive, Role::General, Role::Executive));
    assert!(can_change_role(Role::Executive, Role::Manager, Role::Director));
    assert!(!can_change_role(Role::Director, Role::General, Role::Leader));
    assert!(!can_change_role(Role::Executive, Role::Executive, Role::General));
}

#[test]
fn department_visibility_widens_with_rank() {
    let viewer = Uuid::new_v4();
    let target = Uuid::new_v4();
    let dept_a = Uuid::new_v4();
    let dept_b = Uuid::new_v4();

    assert!(!can_view_user(Role::General, viewer, target, Some(dept_a), Some(dept_a)));
    assert!(can_view_user(Role::Leader, viewer, target, Some(dept_a), Some(dept_a)));
    assert!(!can_view_user(Role::Manager, viewer, target, Some(dept_b), Some(dept_a)));
    assert!(can_view_user(Role::Manager, viewer, target, None, Some(dept_a)));
    assert!(can_view_user(Role::Director, viewer, target, Some(dept_b), Some(dept_a)));
}

#[test]
fn goal_progress_clamps_and_averages() {
    assert_eq!(goal_progress(&[]), 0);
    assert_eq!(goal_progress(&[key_result(5.0, 10.0)]), 50);
    assert_eq!(goal_progress(&[key_result(25.0, 10.0)]), 100);
    assert_eq!(
        goal_progress(&[key_result(25.0, 10.0), key_result(0.0, 10.0)]),
        50
    );
}

#[test]
fn availability_flags_follow_the_clock() {
    let now = Utc::now();

    // Ten minutes into the slot: conductable and completable, no longer
    // editable.
    let running = available_actions(
        OneOnOneStatus::Scheduled,
        true,
        now - Duration::minutes(10),
        now,
    );
    assert!(running.can_conduct);
    assert!(!running.can_edit);
    assert!(!running.can_cancel);
    assert!(running.can_complete);
    assert!(!running.can_export_pdf);

    // Two hours out: editable, nothing else.
    let future = available_actions(
        OneOnOneStatus::Scheduled,
        true,
        now + Duration::hours(2),
        now,
    );
    assert!(future.can_edit);
    assert!(!future.can_conduct);
    assert!(!future.can_complete);

    // Completed meetings only export.
    let done = available_actions(
        OneOnOneStatus::Completed,
        true,
        now - Duration::hours(2),
        now,
    );
    assert!(done.can_export_pdf);
    assert!(!done.can_edit && !done.can_conduct && !done.can_complete);
}

#[test]
fn stats_and_sort_match_the_dashboard_contract() {
    let now = Utc::now();
    let actions = vec![
        next_action(NextActionStatus::Completed, now - Duration::days(1)),
        next_action(NextActionStatus::Pending, now - Duration::days(1)),
        next_action(NextActionStatus::Pending, now + Duration::days(20)),
        next_action(NextActionStatus::Pending, now + Duration::days(21)),
    ];
    let stats = next_action_stats(&actions, now);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.completion_rate, 25);
    assert_eq!(stats.overdue, 1);

    let day1 = now + Duration::days(1);
    let day2 = now + Duration::days(2);
    let day5 = now + Duration::days(5);
    let mut list = vec![
        next_action(NextActionStatus::Completed, day1),
        next_action(NextActionStatus::Pending, day5),
        next_action(NextActionStatus::Pending, day2),
    ];
    sort_for_display(&mut list);
    let order: Vec<_> = list.iter().map(|a| a.due_date).collect();
    assert_eq!(order, vec![day2, day5, day1]);
}
