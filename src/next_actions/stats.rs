use chrono::{DateTime, Utc};
use serde::Serialize;

use super::NextActionStatus;
use crate::shared::models::NextAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NextActionStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub overdue: usize,
    pub due_this_week: usize,
    pub completion_rate: i32,
}

pub fn is_overdue(due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    due_date < now
}

/// Days until the due date, rounded up: later today counts as 0, anything
/// already past goes negative.
pub fn days_until_due(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (due_date - now).num_seconds();
    (seconds as f64 / 86_400.0).ceil() as i64
}

fn is_completed(action: &NextAction) -> bool {
    NextActionStatus::parse(&action.status) == Some(NextActionStatus::Completed)
}

pub fn next_action_stats(actions: &[NextAction], now: DateTime<Utc>) -> NextActionStats {
    let total = actions.len();
    let mut completed = 0;
    let mut in_progress = 0;
    let mut pending = 0;
    let mut overdue = 0;
    let mut due_this_week = 0;

    for action in actions {
        match NextActionStatus::parse(&action.status) {
            Some(NextActionStatus::Completed) => completed += 1,
            Some(NextActionStatus::InProgress) => in_progress += 1,
            Some(NextActionStatus::Pending) => pending += 1,
            None => {}
        }
        if !is_completed(action) {
            if is_overdue(action.due_date, now) {
                overdue += 1;
            }
            let days = days_until_due(action.due_date, now);
            if (0..=7).contains(&days) {
                due_this_week += 1;
            }
        }
    }

    let completion_rate = if total > 0 {
        ((completed as f64 / total as f64) * 100.0).round() as i32
    } else {
        0
    };

    NextActionStats {
        total,
        completed,
        in_progress,
        pending,
        overdue,
        due_this_week,
        completion_rate,
    }
}

/// Display order: everything open first, COMPLETED at the bottom, and the
/// nearest due date first within each group. The sort is stable, so equal
/// keys keep their incoming order.
pub fn sort_for_display(actions: &mut [NextAction]) {
    actions.sort_by_key(|a| (is_completed(a), a.due_date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn action(status: NextActionStatus, due: DateTime<Utc>) -> NextAction {
        let now = Utc::now();
        NextAction {
            id: Uuid::new_v4(),
            one_on_one_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "action".to_string(),
            description: String::new(),
            due_date: due,
            status: status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn stats_over_mixed_statuses() {
        let now = Utc::now();
        let actions = vec![
            action(NextActionStatus::Completed, now - Duration::days(1)),
            action(NextActionStatus::Pending, now - Duration::days(2)),
            action(NextActionStatus::Pending, now + Duration::days(30)),
            action(NextActionStatus::Pending, now + Duration::days(40)),
        ];
        let stats = next_action_stats(&actions, now);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 25);
    }

    #[test]
    fn empty_collection_rates_zero() {
        let stats = next_action_stats(&[], Utc::now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn completed_actions_are_never_overdue_or_due() {
        let now = Utc::now();
        let actions = vec![
            action(NextActionStatus::Completed, now - Duration::days(3)),
            action(NextActionStatus::Completed, now + Duration::days(2)),
        ];
        let stats = next_action_stats(&actions, now);
        assert_eq!(stats.overdue, 0);
        assert_eq!(stats.due_this_week, 0);
        assert_eq!(stats.completion_rate, 100);
    }

    #[test]
    fn due_this_week_counts_the_next_seven_days() {
        let now = Utc::now();
        let actions = vec![
            action(NextActionStatus::Pending, now + Duration::days(3)),
            action(NextActionStatus::InProgress, now + Duration::days(7)),
            action(NextActionStatus::Pending, now + Duration::days(8)),
            action(NextActionStatus::Pending, now - Duration::days(1)),
        ];
        let stats = next_action_stats(&actions, now);
        assert_eq!(stats.due_this_week, 2);
        assert_eq!(stats.overdue, 1);
    }

    #[test]
    fn days_until_due_rounds_up() {
        let now = Utc::now();
        assert_eq!(days_until_due(now + Duration::hours(1), now), 1);
        assert_eq!(days_until_due(now + Duration::days(2), now), 2);
        assert!(days_until_due(now - Duration::days(1) - Duration::hours(1), now) < 0);
    }

    #[test]
    fn display_sort_puts_completed_last_and_nearest_due_first() {
        let now = Utc::now();
        let day1 = now + Duration::days(1);
        let day2 = now + Duration::days(2);
        let day5 = now + Duration::days(5);
        let mut actions = vec![
            action(NextActionStatus::Completed, day1),
            action(NextActionStatus::Pending, day5),
            action(NextActionStatus::Pending, day2),
        ];
        sort_for_display(&mut actions);
        assert_eq!(actions[0].due_date, day2);
        assert_eq!(actions[1].due_date, day5);
        assert_eq!(actions[2].due_date, day1);
        assert_eq!(actions[2].status, NextActionStatus::Completed.as_str());
    }
}
