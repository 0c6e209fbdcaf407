//! Lifecycle notifications for the host application.

use std::fmt;
use std::sync::{Arc, Mutex};

use confsync_core::Millis;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    /// A remote conference answered its first liveness query.
    ConferenceDiscovered,
    /// A discovered conference ended or stopped answering.
    ConferenceEnded,
    /// A local conference could not register its namespace.
    ConferenceAddFailed,
    /// The broadcast namespace could not be registered.
    DiscoveryFailed,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::ConferenceDiscovered => "CONFERENCE_DISCOVERED",
            NotificationKind::ConferenceEnded => "CONFERENCE_ENDED",
            NotificationKind::ConferenceAddFailed => "CONFERENCE_ADD_FAILED",
            NotificationKind::DiscoveryFailed => "DISCOVERY_FAILED",
        })
    }
}

/// One notification delivered to a [`ConferenceObserver`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Human-readable detail.
    pub message: String,
    /// When it happened, in milliseconds on the face's clock.
    pub timestamp: Millis,
}

/// Receiver of engine notifications.
///
/// Called synchronously from inside event handling; must not block.
pub trait ConferenceObserver {
    fn on_notification(&mut self, notification: Notification);
}

/// Observer that writes every notification to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ConferenceObserver for TracingObserver {
    fn on_notification(&mut self, notification: Notification) {
        match notification.kind {
            NotificationKind::ConferenceAddFailed | NotificationKind::DiscoveryFailed => warn!(
                kind = %notification.kind,
                timestamp = notification.timestamp,
                "{}",
                notification.message
            ),
            _ => info!(
                kind = %notification.kind,
                timestamp = notification.timestamp,
                "{}",
                notification.message
            ),
        }
    }
}

/// Observer that keeps every notification in a shared list.
///
/// Clones share the same list, so one clone can be handed to an engine
/// while another is inspected.
#[derive(Debug, Default, Clone)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recorded notifications of one kind.
    pub fn of_kind(&self, kind: NotificationKind) -> Vec<Notification> {
        self.snapshot()
            .into_iter()
            .filter(|n| n.kind == kind)
            .collect()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl ConferenceObserver for NotificationLog {
    fn on_notification(&mut self, notification: Notification) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notification);
    }
}
