/*
[INPUT]:  Outcomes of session operations
[OUTPUT]: User-facing notifications on an unbounded channel
[POS]:    View boundary - toast-style messages
[UPDATE]: When adding notification levels
*/

use std::fmt;

use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Sending half of the notification channel
///
/// Sends never block; notifications sent after the receiver is gone are
/// dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(kind = "success", notification = %message, "notify");
        self.send(NotificationLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        info!(kind = "error", notification = %message, "notify");
        self.send(NotificationLevel::Error, message);
    }

    fn send(&self, level: NotificationLevel, message: String) {
        let _ = self.tx.send(Notification { level, message });
    }
}

/// Create a notifier and the receiver the view drains
pub fn channel() -> (Notifier, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifications_arrive_in_order() {
        let (notifier, mut rx) = channel();
        notifier.success("Task created");
        notifier.error("Wrong password.");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, NotificationLevel::Success);
        assert_eq!(first.message, "Task created");
        let second = rx.try_recv().unwrap();
        assert_eq!(second.level, NotificationLevel::Error);
        assert_eq!(second.to_string(), "Wrong password.");
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (notifier, rx) = channel();
        drop(rx);
        notifier.success("ignored");
    }
}
