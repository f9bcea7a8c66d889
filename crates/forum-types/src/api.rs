use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    NotificationCategory, PenaltyAction, PenaltyState, PostKind, ReportReason, ReportStatus,
    ReportType, Role,
};

// -- JWT Claims --

/// JWT claims issued at login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Authors may touch their own rows; admins may touch anyone's.
    pub fn can_modify(&self, owner_id: i64) -> bool {
        self.sub == owner_id || self.is_admin()
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub role: Role,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    pub token: String,
}

// -- Posts --

fn default_kind() -> PostKind {
    PostKind::Article
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    #[serde(default = "default_kind")]
    pub kind: PostKind,
    pub title: String,
    pub body: String,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub kind: PostKind,
    pub title: String,
    pub body: String,
    pub author_id: i64,
    pub author_username: String,
    pub category_id: Option<i64>,
    pub tags: Vec<String>,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub name: String,
    pub post_count: i64,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetApprovalRequest {
    pub approved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub author_id: i64,
    pub author_username: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// -- Reports --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReportRequest {
    pub report_type: ReportType,
    pub target_id: i64,
    pub reason: ReportReason,
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewReportRequest {
    pub status: ReportStatus,
    #[serde(default)]
    pub is_false_report: bool,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub id: i64,
    pub reporter_id: i64,
    pub report_type: ReportType,
    pub target_id: i64,
    pub reason: ReportReason,
    pub details: Option<String>,
    pub status: ReportStatus,
    pub is_false_report: bool,
    pub reviewed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

// -- Report penalties --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PenaltyActionRequest {
    pub action: PenaltyAction,
}

#[derive(Debug, Serialize)]
pub struct ReportWarningResponse {
    pub user_id: i64,
    pub warning_count: u32,
    pub is_banned_from_reporting: bool,
    pub ban_until: Option<DateTime<Utc>>,
    pub state: PenaltyState,
    /// Whether the ban currently blocks reporting under the configured expiry policy.
    pub ban_active: bool,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: i64,
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
