use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::OneOnOneStatus;

/// Actions currently open to a caller on a one-on-one, derived from the
/// meeting status, whether the caller participates, and the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailableActions {
    pub can_edit: bool,
    pub can_cancel: bool,
    pub can_conduct: bool,
    pub can_complete: bool,
    pub can_export_pdf: bool,
}

/// The conduct window opens 30 minutes before the scheduled slot and stays
/// open for 60 minutes after it.
pub fn within_conduct_window(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let opens = scheduled_at - Duration::minutes(30);
    let closes = scheduled_at + Duration::minutes(60);
    now >= opens && now <= closes
}

pub fn available_actions(
    status: OneOnOneStatus,
    is_participant: bool,
    scheduled_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AvailableActions {
    let scheduled = status == OneOnOneStatus::Scheduled;
    let is_past = now > scheduled_at;
    AvailableActions {
        can_edit: scheduled && !is_past && is_participant,
        can_cancel: scheduled && !is_past && is_participant,
        can_conduct: scheduled && is_participant && within_conduct_window(scheduled_at, now),
        can_complete: scheduled && is_past && is_participant,
        can_export_pdf: status == OneOnOneStatus::Completed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(now: DateTime<Utc>, offset_minutes: i64) -> DateTime<Utc> {
        now + Duration::minutes(offset_minutes)
    }

    #[test]
    fn upcoming_meeting_is_editable_but_not_conductable() {
        let now = Utc::now();
        let actions =
            available_actions(OneOnOneStatus::Scheduled, true, at(now, 120), now);
        assert!(actions.can_edit);
        assert!(actions.can_cancel);
        assert!(!actions.can_conduct);
        assert!(!actions.can_complete);
        assert!(!actions.can_export_pdf);
    }

    #[test]
    fn just_started_meeting_is_conductable_not_editable() {
        // Ten minutes into the slot: the edit cutoff (now <= scheduled_at)
        // has passed, the conduct window is open, and completion unlocks.
        let now = Utc::now();
        let actions =
            available_actions(OneOnOneStatus::Scheduled, true, at(now, -10), now);
        assert!(!actions.can_edit);
        assert!(!actions.can_cancel);
        assert!(actions.can_conduct);
        assert!(actions.can_complete);
    }

    #[test]
    fn conduct_window_opens_thirty_minutes_early() {
        let now = Utc::now();
        assert!(within_conduct_window(at(now, 29), now));
        assert!(!within_conduct_window(at(now, 31), now));
    }

    #[test]
    fn conduct_window_closes_sixty_minutes_late() {
        let now = Utc::now();
        assert!(within_conduct_window(at(now, -59), now));
        assert!(!within_conduct_window(at(now, -61), now));
    }

    #[test]
    fn long_past_meeting_only_offers_complete() {
        let now = Utc::now();
        let actions =
            available_actions(OneOnOneStatus::Scheduled, true, at(now, -180), now);
        assert!(!actions.can_edit);
        assert!(!actions.can_conduct);
        assert!(actions.can_complete);
    }

    #[test]
    fn non_participants_get_nothing_on_scheduled_meetings() {
        let now = Utc::now();
        let actions =
            available_actions(OneOnOneStatus::Scheduled, false, at(now, -10), now);
        assert!(!actions.can_edit);
        assert!(!actions.can_cancel);
        assert!(!actions.can_conduct);
        assert!(!actions.can_complete);
    }

    #[test]
    fn completed_meeting_only_exports() {
        let now = Utc::now();
        let actions =
            available_actions(OneOnOneStatus::Completed, true, at(now, -10), now);
        assert_eq!(
            actions,
            AvailableActions {
                can_edit: false,
                can_cancel: false,
                can_conduct: false,
                can_complete: false,
                can_export_pdf: true,
            }
        );
    }

    #[test]
    fn cancelled_meeting_offers_nothing() {
        let now = Utc::now();
        let actions =
            available_actions(OneOnOneStatus::Cancelled, true, at(now, 10), now);
        assert!(!actions.can_edit);
        assert!(!actions.can_export_pdf);
    }
}
