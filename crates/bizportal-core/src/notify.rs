//! User-visible notification channel.
//!
//! Failed requests surface as short-lived toasts. The front end decides how
//! to render them; this module only queues them and tracks expiry.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

/// How long a toast stays visible, in milliseconds
pub const TOAST_DISPLAY_MS: i64 = 3000;

/// Oldest toasts are dropped once the queue holds this many
const MAX_QUEUED_TOASTS: usize = 32;

/// A failure message shown to the user. Every notification is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.raised_at + Duration::milliseconds(TOAST_DISPLAY_MS)
    }
}

/// Sink for user-visible notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// In-memory toast queue for front ends that poll.
#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Mutex<VecDeque<Notification>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toasts that have not yet been auto-dismissed.
    pub fn active(&self) -> Vec<Notification> {
        match self.toasts.lock() {
            Ok(mut toasts) => {
                toasts.retain(|t| !t.is_expired());
                toasts.iter().cloned().collect()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Take every queued toast, expired or not.
    pub fn drain(&self) -> Vec<Notification> {
        match self.toasts.lock() {
            Ok(mut toasts) => toasts.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.toasts.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notification: Notification) {
        if let Ok(mut toasts) = self.toasts.lock() {
            if toasts.len() >= MAX_QUEUED_TOASTS {
                toasts.pop_front();
            }
            toasts.push_back(notification);
        }
    }
}

/// Writes notifications to the log instead of a screen.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        error!(message = %notification.message, raised_at = %notification.raised_at, "notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_expires_after_display_interval() {
        let fresh = Notification::error("Access forbidden.");
        assert!(!fresh.is_expired());

        let mut old = Notification::error("Access forbidden.");
        old.raised_at = Utc::now() - Duration::milliseconds(TOAST_DISPLAY_MS + 1);
        assert!(old.is_expired());
    }

    #[test]
    fn test_active_drops_expired_toasts() {
        let queue = ToastQueue::new();
        let mut old = Notification::error("old");
        old.raised_at = Utc::now() - Duration::seconds(10);
        queue.notify(old);
        queue.notify(Notification::error("new"));

        let active = queue.active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "new");
    }

    #[test]
    fn test_notification_carries_message_and_time_only() {
        let value = serde_json::to_value(Notification::error("Resource not found.")).unwrap();
        let fields = value.as_object().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["message"], "Resource not found.");
        assert!(fields.contains_key("raised_at"));

        // Log-only sink accepts the same notifications
        LogNotifier.notify(Notification::error("Resource not found."));
    }

    #[test]
    fn test_queue_is_bounded() {
        let queue = ToastQueue::new();
        for i in 0..(MAX_QUEUED_TOASTS + 5) {
            queue.notify(Notification::error(format!("toast {}", i)));
        }
        let drained = queue.drain();
        assert_eq!(drained.len(), MAX_QUEUED_TOASTS);
        assert_eq!(drained[0].message, "toast 5");
        assert!(queue.is_empty());
    }
}
