use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored string did not match any variant of the named enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// -- Users --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

// -- Posts --

/// Articles and documents share one table and differ only by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Article,
    Document,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Article => "article",
            PostKind::Document => "document",
        }
    }
}

impl FromStr for PostKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(PostKind::Article),
            "document" => Ok(PostKind::Document),
            other => Err(UnknownVariant::new("post kind", other)),
        }
    }
}

// -- Reports --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    User,
    Post,
    Document,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::User => "user",
            ReportType::Post => "post",
            ReportType::Document => "document",
        }
    }

    /// The post kind a report of this type must point at, if it targets a post row.
    pub fn post_kind(&self) -> Option<PostKind> {
        match self {
            ReportType::User => None,
            ReportType::Post => Some(PostKind::Article),
            ReportType::Document => Some(PostKind::Document),
        }
    }
}

impl FromStr for ReportType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(ReportType::User),
            "post" => Ok(ReportType::Post),
            "document" => Ok(ReportType::Document),
            other => Err(UnknownVariant::new("report type", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Harassment,
    Inappropriate,
    Misinformation,
    Copyright,
    Other,
}

impl ReportReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportReason::Spam => "spam",
            ReportReason::Harassment => "harassment",
            ReportReason::Inappropriate => "inappropriate",
            ReportReason::Misinformation => "misinformation",
            ReportReason::Copyright => "copyright",
            ReportReason::Other => "other",
        }
    }
}

impl FromStr for ReportReason {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spam" => Ok(ReportReason::Spam),
            "harassment" => Ok(ReportReason::Harassment),
            "inappropriate" => Ok(ReportReason::Inappropriate),
            "misinformation" => Ok(ReportReason::Misinformation),
            "copyright" => Ok(ReportReason::Copyright),
            "other" => Ok(ReportReason::Other),
            other => Err(UnknownVariant::new("report reason", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
    Dismissed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Dismissed => "dismissed",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "resolved" => Ok(ReportStatus::Resolved),
            "dismissed" => Ok(ReportStatus::Dismissed),
            other => Err(UnknownVariant::new("report status", other)),
        }
    }
}

// -- Report penalties --

/// Admin actions on a user's false-report penalty record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyAction {
    ReduceWarning,
    Unban,
    ResetAll,
}

impl PenaltyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyAction::ReduceWarning => "reduce_warning",
            PenaltyAction::Unban => "unban",
            PenaltyAction::ResetAll => "reset_all",
        }
    }
}

impl FromStr for PenaltyAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reduce_warning" => Ok(PenaltyAction::ReduceWarning),
            "unban" => Ok(PenaltyAction::Unban),
            "reset_all" => Ok(PenaltyAction::ResetAll),
            other => Err(UnknownVariant::new("penalty action", other)),
        }
    }
}

impl fmt::Display for PenaltyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyState {
    Clear,
    Warned,
    Banned,
}

// -- Notifications --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    CommentReply,
    PostComment,
    ReportWarning,
    ReportBan,
    ReportPenalty,
    ReportReviewed,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::CommentReply => "comment_reply",
            NotificationCategory::PostComment => "post_comment",
            NotificationCategory::ReportWarning => "report_warning",
            NotificationCategory::ReportBan => "report_ban",
            NotificationCategory::ReportPenalty => "report_penalty",
            NotificationCategory::ReportReviewed => "report_reviewed",
        }
    }
}

impl FromStr for NotificationCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comment_reply" => Ok(NotificationCategory::CommentReply),
            "post_comment" => Ok(NotificationCategory::PostComment),
            "report_warning" => Ok(NotificationCategory::ReportWarning),
            "report_ban" => Ok(NotificationCategory::ReportBan),
            "report_penalty" => Ok(NotificationCategory::ReportPenalty),
            "report_reviewed" => Ok(NotificationCategory::ReportReviewed),
            other => Err(UnknownVariant::new("notification category", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalty_action_parses_known_names() {
        assert_eq!("reduce_warning".parse::<PenaltyAction>(), Ok(PenaltyAction::ReduceWarning));
        assert_eq!("unban".parse::<PenaltyAction>(), Ok(PenaltyAction::Unban));
        assert_eq!("reset_all".parse::<PenaltyAction>(), Ok(PenaltyAction::ResetAll));
    }

    #[test]
    fn penalty_action_rejects_unknown_name() {
        let err = "ban_forever".parse::<PenaltyAction>().unwrap_err();
        assert_eq!(err.value, "ban_forever");
        assert_eq!(err.to_string(), "unknown penalty action 'ban_forever'");
    }

    #[test]
    fn report_type_maps_to_post_kind() {
        assert_eq!(ReportType::User.post_kind(), None);
        assert_eq!(ReportType::Post.post_kind(), Some(PostKind::Article));
        assert_eq!(ReportType::Document.post_kind(), Some(PostKind::Document));
    }

    #[test]
    fn serde_names_match_stored_names() {
        let json = serde_json::to_string(&ReportStatus::Dismissed).unwrap();
        assert_eq!(json, format!("\"{}\"", ReportStatus::Dismissed.as_str()));
        let json = serde_json::to_string(&NotificationCategory::ReportBan).unwrap();
        assert_eq!(json, format!("\"{}\"", NotificationCategory::ReportBan.as_str()));
    }
}
