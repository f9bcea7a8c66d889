use serde::Serialize;
use tracing::warn;

use forum_types::models::NotificationCategory;

/// A user-facing message queued for later delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub user_id: i64,
    pub category: NotificationCategory,
    pub title: String,
    pub body: String,
    pub related_id: Option<i64>,
}

/// Destination for notifications. Implementations persist or forward them.
pub trait NotificationSink {
    fn send(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Hand a notification to the sink. Failures are logged and swallowed so the
/// action that triggered the notification still succeeds.
pub fn deliver<S: NotificationSink + ?Sized>(sink: &S, notification: &Notification) {
    if let Err(e) = sink.send(notification) {
        warn!(
            "Failed to deliver {} notification to user {}: {}",
            notification.category.as_str(),
            notification.user_id,
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn send(&self, _: &Notification) -> anyhow::Result<()> {
            anyhow::bail!("sink offline")
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<Notification>>);

    impl NotificationSink for RecordingSink {
        fn send(&self, notification: &Notification) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    fn sample() -> Notification {
        Notification {
            user_id: 7,
            category: NotificationCategory::ReportPenalty,
            title: "t".into(),
            body: "b".into(),
            related_id: None,
        }
    }

    #[test]
    fn deliver_swallows_sink_errors() {
        deliver(&FailingSink, &sample());
    }

    #[test]
    fn deliver_forwards_to_sink() {
        let sink = RecordingSink::default();
        deliver(&sink, &sample());
        assert_eq!(sink.0.lock().unwrap().as_slice(), &[sample()]);
    }
}
