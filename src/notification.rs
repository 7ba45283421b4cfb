//! Decode and write diagnostics.
//!
//! Recoverable problems met while scanning a design file (a vertex list
//! trimmed to what fits, a linkage running past its record, a complex group
//! spanning several levels) do not abort the operation. They are collected
//! as [`Notification`] items on the session and mirrored to `tracing`, so a
//! caller can either inspect [`DgnFile::notifications`] after the fact or
//! subscribe to the log stream.
//!
//! [`DgnFile::notifications`]: crate::io::dgn::DgnFile::notifications

use std::fmt;

/// Severity level of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// A record kind the codec recognises but does not decode.
    NotImplemented,
    /// The file uses a feature this codec cannot honour.
    NotSupported,
    /// Data was adjusted to make it usable (trimmed, clamped, defaulted).
    Warning,
    /// Data was inconsistent and part of it was dropped.
    Error,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotImplemented => write!(f, "NotImplemented"),
            Self::NotSupported => write!(f, "NotSupported"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// A single diagnostic, optionally tied to the element that produced it.
#[derive(Debug, Clone)]
pub struct Notification {
    pub notification_type: NotificationType,
    /// Sequence id of the element being processed, when known.
    pub element_id: Option<usize>,
    pub message: String,
}

impl Notification {
    pub fn new(notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            element_id: None,
            message: message.into(),
        }
    }

    /// Attach the id of the element the message is about.
    pub fn with_element(mut self, element_id: usize) -> Self {
        self.element_id = Some(element_id);
        self
    }

    fn log(&self) {
        let id = self.element_id.map(|id| id as i64).unwrap_or(-1);
        match self.notification_type {
            NotificationType::Error => tracing::error!(element = id, "{}", self.message),
            NotificationType::Warning => tracing::warn!(element = id, "{}", self.message),
            NotificationType::NotImplemented | NotificationType::NotSupported => {
                tracing::debug!(element = id, kind = %self.notification_type, "{}", self.message)
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.element_id {
            Some(id) => write!(f, "[{}] element {}: {}", self.notification_type, id, self.message),
            None => write!(f, "[{}] {}", self.notification_type, self.message),
        }
    }
}

/// Notifications gathered over the lifetime of a session.
#[derive(Debug, Clone, Default)]
pub struct NotificationCollection {
    items: Vec<Notification>,
}

impl NotificationCollection {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Record a notification and emit it as a log event.
    pub fn notify(&mut self, notification_type: NotificationType, message: impl Into<String>) {
        self.push(Notification::new(notification_type, message));
    }

    /// Record a notification about a specific element.
    pub fn notify_element(
        &mut self,
        notification_type: NotificationType,
        element_id: usize,
        message: impl Into<String>,
    ) {
        self.push(Notification::new(notification_type, message).with_element(element_id));
    }

    pub fn push(&mut self, notification: Notification) {
        notification.log();
        self.items.push(notification);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Notification> {
        self.items.iter()
    }

    /// Get all notifications of a specific type.
    pub fn of_type(&self, nt: NotificationType) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.notification_type == nt).collect()
    }

    /// Check whether any notification of the given type exists.
    pub fn has_type(&self, nt: NotificationType) -> bool {
        self.items.iter().any(|n| n.notification_type == nt)
    }

    /// Drop everything collected so far.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn into_vec(self) -> Vec<Notification> {
        self.items
    }
}

impl IntoIterator for NotificationCollection {
    type Item = Notification;
    type IntoIter = std::vec::IntoIter<Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a NotificationCollection {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
