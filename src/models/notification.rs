//! Per-user notifications: an append-only activity log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{DatabaseID, UserID};

/// The severity tag attached to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Neutral information, e.g. a premium feature was unlocked.
    Info,
    /// A completed action, e.g. a transaction was recorded.
    Success,
    /// Something the user should look at.
    Warning,
    /// A failed action.
    Error,
}

impl NotificationKind {
    /// The database representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        }
    }

    /// Parse the database representation of the kind.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "info" => Some(NotificationKind::Info),
            "success" => Some(NotificationKind::Success),
            "warning" => Some(NotificationKind::Warning),
            "error" => Some(NotificationKind::Error),
            _ => None,
        }
    }
}

/// An informational record tied to a user action.
///
/// Notifications are only ever created by internal actions (never directly
/// by a client request), optionally marked read, and removed only when the
/// owning user is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    id: DatabaseID,
    user_id: UserID,
    message: String,
    #[serde(rename = "type")]
    kind: NotificationKind,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new `Notification`. Does not touch the database.
    pub fn new(
        id: DatabaseID,
        user_id: UserID,
        message: String,
        kind: NotificationKind,
        is_read: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            message,
            kind,
            is_read,
            created_at,
        }
    }

    /// The notification's ID in the database.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The ID of the owning user.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The severity tag.
    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    /// Whether the user has marked the notification as read.
    pub fn is_read(&self) -> bool {
        self.is_read
    }

    /// When the notification was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
