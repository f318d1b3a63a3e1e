use crate::shared::models::KeyResult;

/// Overall progress of a goal: each key result contributes
/// min(current/target, 1) and the goal takes the rounded mean. An empty
/// key-result set reads as 0%; an overshooting key result caps at 100.
pub fn goal_progress(key_results: &[KeyResult]) -> i32 {
    if key_results.is_empty() {
        return 0;
    }
    let total: f64 = key_results
        .iter()
        .map(|kr| {
            if kr.target_value <= 0.0 {
                0.0
            } else {
                ((kr.current_value / kr.target_value) * 100.0).min(100.0)
            }
        })
        .sum();
    (total / key_results.len() as f64).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn kr(current: f64, target: f64) -> KeyResult {
        let now = Utc::now();
        KeyResult {
            id: Uuid::new_v4(),
            goal_id: Uuid::new_v4(),
            title: "kr".to_string(),
            target_value: target,
            current_value: current,
            unit: "count".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_set_is_zero() {
        assert_eq!(goal_progress(&[]), 0);
    }

    #[test]
    fn halfway_key_result_is_fifty() {
        assert_eq!(goal_progress(&[kr(5.0, 10.0)]), 50);
    }

    #[test]
    fn overshoot_clamps_to_one_hundred() {
        assert_eq!(goal_progress(&[kr(20.0, 10.0)]), 100);
        // The clamped result must not drag the average above 100.
        assert_eq!(goal_progress(&[kr(20.0, 10.0), kr(0.0, 10.0)]), 50);
    }

    #[test]
    fn mean_across_key_results() {
        assert_eq!(goal_progress(&[kr(10.0, 10.0), kr(0.0, 10.0)]), 50);
        assert_eq!(goal_progress(&[kr(3.0, 10.0), kr(5.0, 10.0)]), 40);
    }

    #[test]
    fn zero_target_contributes_nothing() {
        assert_eq!(goal_progress(&[kr(5.0, 0.0)]), 0);
    }
}
