use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use forum_types::models::{NotificationCategory, PenaltyAction, PenaltyState, UnknownVariant};

use crate::notify::Notification;

/// Per-user record of false-report warnings and the reporting ban they lead to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportWarning {
    pub user_id: i64,
    pub warning_count: u32,
    pub is_banned_from_reporting: bool,
    pub ban_until: Option<DateTime<Utc>>,
}

impl ReportWarning {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            warning_count: 0,
            is_banned_from_reporting: false,
            ban_until: None,
        }
    }

    pub fn state(&self) -> PenaltyState {
        if self.is_banned_from_reporting {
            PenaltyState::Banned
        } else if self.warning_count > 0 {
            PenaltyState::Warned
        } else {
            PenaltyState::Clear
        }
    }

    /// Whether the ban blocks reporting at `now`. Under `Manual` expiry a ban
    /// stays in force until an admin lifts it, whatever `ban_until` says.
    pub fn is_ban_active(&self, now: DateTime<Utc>, expiry: BanExpiry) -> bool {
        if !self.is_banned_from_reporting {
            return false;
        }
        match expiry {
            BanExpiry::Manual => true,
            BanExpiry::Automatic => self.ban_until.is_none_or(|until| now < until),
        }
    }

    pub fn ban_expired(&self, now: DateTime<Utc>) -> bool {
        self.is_banned_from_reporting && self.ban_until.is_some_and(|until| until <= now)
    }
}

/// How a reporting ban ends once `ban_until` has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BanExpiry {
    /// Only an admin `unban` or `reset_all` ends the ban.
    #[default]
    Manual,
    /// The ban stops applying at `ban_until` and is cleared by the sweep.
    Automatic,
}

impl FromStr for BanExpiry {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(BanExpiry::Manual),
            "automatic" | "auto" => Ok(BanExpiry::Automatic),
            other => Err(UnknownVariant::new("ban expiry", other)),
        }
    }
}

/// Knobs for the automatic false-report penalty.
#[derive(Debug, Clone, Copy)]
pub struct PenaltyPolicy {
    /// Warnings at which the reporter gets banned from reporting.
    pub false_report_threshold: u32,
    pub ban_duration: Duration,
    pub ban_expiry: BanExpiry,
}

impl Default for PenaltyPolicy {
    fn default() -> Self {
        Self {
            false_report_threshold: 3,
            ban_duration: Duration::days(7),
            ban_expiry: BanExpiry::Manual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PenaltyError {
    #[error("User has no report penalty record")]
    NoPenaltyRecord,

    #[error("Invalid penalty action: {0}")]
    InvalidAction(String),

    #[error("Warning count is already zero")]
    AlreadyAtFloor,

    #[error("User is not banned from reporting")]
    NotBanned,
}

impl From<UnknownVariant> for PenaltyError {
    fn from(e: UnknownVariant) -> Self {
        PenaltyError::InvalidAction(e.value)
    }
}

/// The record to persist and the notification to send for one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyOutcome {
    pub new_state: ReportWarning,
    pub notification: Notification,
}

/// Apply an admin action to a user's penalty record.
///
/// Fails before computing anything when the user has no record. The caller
/// persists `new_state` and hands `notification` to a sink.
pub fn apply_penalty_action(
    current: Option<&ReportWarning>,
    action: PenaltyAction,
) -> Result<PenaltyOutcome, PenaltyError> {
    let current = current.ok_or(PenaltyError::NoPenaltyRecord)?;
    let mut next = current.clone();

    let (title, body) = match action {
        PenaltyAction::ReduceWarning => {
            if next.warning_count == 0 {
                return Err(PenaltyError::AlreadyAtFloor);
            }
            next.warning_count -= 1;
            (
                "Report warning reduced",
                format!(
                    "An administrator removed one false-report warning. \
                     You now have {} warning(s).",
                    next.warning_count
                ),
            )
        }
        PenaltyAction::Unban => {
            if !next.is_banned_from_reporting {
                return Err(PenaltyError::NotBanned);
            }
            next.is_banned_from_reporting = false;
            next.ban_until = None;
            (
                "Reporting ban lifted",
                "An administrator lifted your reporting ban. You can submit reports again."
                    .to_string(),
            )
        }
        PenaltyAction::ResetAll => {
            next = ReportWarning::new(current.user_id);
            (
                "Report penalties cleared",
                "An administrator cleared all of your false-report warnings and bans.".to_string(),
            )
        }
    };

    let notification = Notification {
        user_id: next.user_id,
        category: NotificationCategory::ReportPenalty,
        title: title.to_string(),
        body,
        related_id: None,
    };

    Ok(PenaltyOutcome {
        new_state: next,
        notification,
    })
}

/// Count one false report against `user_id`, banning them from reporting once
/// the policy threshold is reached. Creates the record when none exists.
pub fn record_false_report(
    current: Option<&ReportWarning>,
    user_id: i64,
    report_id: i64,
    policy: &PenaltyPolicy,
    now: DateTime<Utc>,
) -> PenaltyOutcome {
    let mut next = current
        .cloned()
        .unwrap_or_else(|| ReportWarning::new(user_id));
    next.warning_count = next.warning_count.saturating_add(1);

    let threshold = policy.false_report_threshold.max(1);
    let already_banned = next.is_ban_active(now, policy.ban_expiry);

    let notification = if next.warning_count >= threshold && !already_banned {
        let until = now + policy.ban_duration;
        next.is_banned_from_reporting = true;
        next.ban_until = Some(until);
        Notification {
            user_id,
            category: NotificationCategory::ReportBan,
            title: "Reporting suspended".to_string(),
            body: format!(
                "Report #{} was found to be false. \
                 With {} warnings you cannot submit reports until {}.",
                report_id,
                next.warning_count,
                until.format("%Y-%m-%d %H:%M UTC")
            ),
            related_id: Some(report_id),
        }
    } else {
        Notification {
            user_id,
            category: NotificationCategory::ReportWarning,
            title: "False report warning".to_string(),
            body: format!(
                "Report #{} was found to be false. You have {} of {} warnings.",
                report_id, next.warning_count, threshold
            ),
            related_id: Some(report_id),
        }
    };

    PenaltyOutcome {
        new_state: next,
        notification,
    }
}

/// Clear a ban whose `ban_until` has passed. Returns `None` when there is
/// nothing to lift.
pub fn lift_expired_ban(current: &ReportWarning, now: DateTime<Utc>) -> Option<PenaltyOutcome> {
    if !current.ban_expired(now) {
        return None;
    }

    let mut next = current.clone();
    next.is_banned_from_reporting = false;
    next.ban_until = None;

    Some(PenaltyOutcome {
        notification: Notification {
            user_id: next.user_id,
            category: NotificationCategory::ReportPenalty,
            title: "Reporting ban expired".to_string(),
            body: "Your reporting ban has expired. You can submit reports again.".to_string(),
            related_id: None,
        },
        new_state: next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(count: u32, banned: bool) -> ReportWarning {
        ReportWarning {
            user_id: 42,
            warning_count: count,
            is_banned_from_reporting: banned,
            ban_until: banned.then(|| Utc::now() + Duration::days(3)),
        }
    }

    #[test]
    fn states_follow_fields() {
        assert_eq!(ReportWarning::new(1).state(), PenaltyState::Clear);
        assert_eq!(record(2, false).state(), PenaltyState::Warned);
        assert_eq!(record(0, true).state(), PenaltyState::Banned);
        assert_eq!(record(5, true).state(), PenaltyState::Banned);
    }

    #[test]
    fn missing_record_fails_for_every_action() {
        for action in [
            PenaltyAction::ReduceWarning,
            PenaltyAction::Unban,
            PenaltyAction::ResetAll,
        ] {
            assert_eq!(
                apply_penalty_action(None, action),
                Err(PenaltyError::NoPenaltyRecord)
            );
        }
    }

    #[test]
    fn reduce_at_zero_fails_and_leaves_state() {
        let current = record(0, false);
        let err = apply_penalty_action(Some(&current), PenaltyAction::ReduceWarning).unwrap_err();
        assert_eq!(err, PenaltyError::AlreadyAtFloor);
        assert_eq!(current, record(0, false));
    }

    #[test]
    fn reduce_decrements_by_one_with_one_notification() {
        let current = record(3, false);
        let outcome = apply_penalty_action(Some(&current), PenaltyAction::ReduceWarning).unwrap();

        assert_eq!(outcome.new_state.warning_count, 2);
        assert_eq!(outcome.new_state.state(), PenaltyState::Warned);
        assert_eq!(outcome.notification.user_id, 42);
        assert_eq!(outcome.notification.category, NotificationCategory::ReportPenalty);
    }

    #[test]
    fn reduce_to_zero_clears() {
        let outcome =
            apply_penalty_action(Some(&record(1, false)), PenaltyAction::ReduceWarning).unwrap();
        assert_eq!(outcome.new_state.state(), PenaltyState::Clear);
    }

    #[test]
    fn reduce_does_not_touch_ban() {
        let current = record(3, true);
        let outcome = apply_penalty_action(Some(&current), PenaltyAction::ReduceWarning).unwrap();
        assert!(outcome.new_state.is_banned_from_reporting);
        assert_eq!(outcome.new_state.ban_until, current.ban_until);
    }

    #[test]
    fn unban_without_ban_fails() {
        let err = apply_penalty_action(Some(&record(2, false)), PenaltyAction::Unban).unwrap_err();
        assert_eq!(err, PenaltyError::NotBanned);
    }

    #[test]
    fn unban_clears_ban_but_keeps_count() {
        let outcome = apply_penalty_action(Some(&record(4, true)), PenaltyAction::Unban).unwrap();
        assert!(!outcome.new_state.is_banned_from_reporting);
        assert_eq!(outcome.new_state.ban_until, None);
        assert_eq!(outcome.new_state.warning_count, 4);
    }

    #[test]
    fn reset_all_from_any_state() {
        for current in [record(0, false), record(2, false), record(0, true), record(9, true)] {
            let outcome = apply_penalty_action(Some(&current), PenaltyAction::ResetAll).unwrap();
            assert_eq!(outcome.new_state, ReportWarning::new(42));
            assert_eq!(outcome.notification.user_id, 42);
        }
    }

    #[test]
    fn unknown_action_string_is_invalid_action() {
        let err: PenaltyError = "promote".parse::<PenaltyAction>().unwrap_err().into();
        assert_eq!(err, PenaltyError::InvalidAction("promote".into()));
    }

    #[test]
    fn first_false_report_creates_record() {
        let now = Utc::now();
        let outcome = record_false_report(None, 7, 100, &PenaltyPolicy::default(), now);

        assert_eq!(outcome.new_state.user_id, 7);
        assert_eq!(outcome.new_state.warning_count, 1);
        assert!(!outcome.new_state.is_banned_from_reporting);
        assert_eq!(outcome.notification.category, NotificationCategory::ReportWarning);
        assert_eq!(outcome.notification.related_id, Some(100));
    }

    #[test]
    fn reaching_threshold_bans_until_duration() {
        let now = Utc::now();
        let policy = PenaltyPolicy::default();
        let current = ReportWarning {
            user_id: 7,
            warning_count: 2,
            is_banned_from_reporting: false,
            ban_until: None,
        };
        let outcome = record_false_report(Some(&current), 7, 101, &policy, now);

        assert_eq!(outcome.new_state.warning_count, 3);
        assert!(outcome.new_state.is_banned_from_reporting);
        assert_eq!(outcome.new_state.ban_until, Some(now + policy.ban_duration));
        assert_eq!(outcome.notification.category, NotificationCategory::ReportBan);
    }

    #[test]
    fn active_ban_is_not_extended() {
        let now = Utc::now();
        let current = record(3, true);
        let outcome = record_false_report(Some(&current), 42, 5, &PenaltyPolicy::default(), now);

        assert_eq!(outcome.new_state.warning_count, 4);
        assert_eq!(outcome.new_state.ban_until, current.ban_until);
        assert_eq!(outcome.notification.category, NotificationCategory::ReportWarning);
    }

    #[test]
    fn ban_activity_depends_on_expiry_policy() {
        let now = Utc::now();
        let expired = ReportWarning {
            user_id: 1,
            warning_count: 3,
            is_banned_from_reporting: true,
            ban_until: Some(now - Duration::hours(1)),
        };

        assert!(expired.is_ban_active(now, BanExpiry::Manual));
        assert!(!expired.is_ban_active(now, BanExpiry::Automatic));
        assert!(record(3, true).is_ban_active(now, BanExpiry::Automatic));
        assert!(!record(3, false).is_ban_active(now, BanExpiry::Manual));
    }

    #[test]
    fn lift_expired_ban_only_when_past_deadline() {
        let now = Utc::now();
        assert!(lift_expired_ban(&record(3, true), now).is_none());
        assert!(lift_expired_ban(&record(3, false), now).is_none());

        let expired = ReportWarning {
            user_id: 1,
            warning_count: 3,
            is_banned_from_reporting: true,
            ban_until: Some(now - Duration::minutes(1)),
        };
        let outcome = lift_expired_ban(&expired, now).unwrap();
        assert!(!outcome.new_state.is_banned_from_reporting);
        assert_eq!(outcome.new_state.ban_until, None);
        assert_eq!(outcome.new_state.warning_count, 3);
    }

    #[test]
    fn ban_expiry_parses_config_values() {
        assert_eq!("manual".parse::<BanExpiry>(), Ok(BanExpiry::Manual));
        assert_eq!("Automatic".parse::<BanExpiry>(), Ok(BanExpiry::Automatic));
        assert!("sometimes".parse::<BanExpiry>().is_err());
    }
}
