//! Forum logic that does not touch HTTP or SQL: comment threading and the
//! false-report penalty state machine.

pub mod comment_tree;
pub mod notify;
pub mod penalty;

pub use comment_tree::{CommentNode, CommentTree, Pagination, Threaded, build_comment_tree};
pub use notify::{Notification, NotificationSink, deliver};
pub use penalty::{
    BanExpiry, PenaltyError, PenaltyOutcome, PenaltyPolicy, ReportWarning, apply_penalty_action,
    lift_expired_ban, record_false_report,
};
