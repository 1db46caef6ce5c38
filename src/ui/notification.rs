use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use super::html::escape;

pub const NOTIFICATION_TTL: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Warning => "warning",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NotificationKind);

    fn success(&self, message: &str) {
        self.notify(message, NotificationKind::Success);
    }

    fn error(&self, message: &str) {
        self.notify(message, NotificationKind::Error);
    }

    fn warning(&self, message: &str) {
        self.notify(message, NotificationKind::Warning);
    }
}

struct Shown {
    notification: Notification,
    at: Instant,
}

/// Single-slot notification bar. A new message replaces the visible one and
/// restarts its auto-hide timer.
pub struct NotificationBar {
    ttl: Duration,
    shown: Mutex<Option<Shown>>,
    history: Mutex<Vec<Notification>>,
}

impl Default for NotificationBar {
    fn default() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }
}

impl NotificationBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            shown: Mutex::new(None),
            history: Mutex::new(Vec::new()),
        }
    }

    /// The notification still visible, if any.
    pub fn current(&self) -> Option<Notification> {
        let shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        shown
            .as_ref()
            .filter(|s| s.at.elapsed() < self.ttl)
            .map(|s| s.notification.clone())
    }

    pub fn history(&self) -> Vec<Notification> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).last().cloned()
    }

    pub fn render(&self) -> String {
        match self.current() {
            Some(n) => format!(
                r#"<div id="notification-bar" class="{} show">{}</div>"#,
                n.kind,
                escape(&n.message)
            ),
            None => r#"<div id="notification-bar"></div>"#.to_string(),
        }
    }
}

impl Notifier for NotificationBar {
    fn notify(&self, message: &str, kind: NotificationKind) {
        match kind {
            NotificationKind::Success => info!("notify: {}", message),
            NotificationKind::Warning => warn!("notify: {}", message),
            NotificationKind::Error => error!("notify: {}", message),
        }
        let notification = Notification {
            message: message.to_string(),
            kind,
        };
        *self.shown.lock().unwrap_or_else(|e| e.into_inner()) = Some(Shown {
            notification: notification.clone(),
            at: Instant::now(),
        });
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn hides_after_ttl_and_restarts_on_new_message() {
        let bar = NotificationBar::new();
        bar.success("Saved");
        assert_eq!(bar.current().map(|n| n.kind), Some(NotificationKind::Success));

        tokio::time::advance(Duration::from_millis(3000)).await;
        bar.error("Boom");
        tokio::time::advance(Duration::from_millis(1000)).await;
        assert_eq!(bar.current().map(|n| n.message), Some("Boom".to_string()));

        tokio::time::advance(Duration::from_millis(2600)).await;
        assert_eq!(bar.current(), None);
        assert_eq!(bar.history().len(), 2);
        assert_eq!(bar.render(), r#"<div id="notification-bar"></div>"#);
    }
}
