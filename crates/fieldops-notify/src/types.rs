//! Notification row types.

use serde::{Deserialize, Serialize};

/// One notification row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notification {
    /// Row ID (`notif-` prefix).
    pub id: String,
    /// Recipient.
    pub to_user_id: String,
    /// Originating user, when the event had one.
    pub created_by_id: Option<String>,
    /// Short title.
    pub title: Option<String>,
    /// Message body.
    pub message: String,
    /// Deep link into the frontend.
    pub url: Option<String>,
    /// Referenced entity kind, e.g. `task`.
    pub entity_type: Option<String>,
    /// Referenced entity ID.
    pub entity_id: Option<String>,
    /// Read flag.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// When it was first marked read.
    pub read_at: Option<String>,
}

/// Parameters for inserting one notification row.
#[derive(Clone, Debug, Default)]
pub struct NotificationCreateParams {
    /// Recipient.
    pub to_user_id: String,
    /// Originating user.
    pub created_by_id: Option<String>,
    /// Short title.
    pub title: Option<String>,
    /// Message body.
    pub message: String,
    /// Deep link into the frontend.
    pub url: Option<String>,
    /// Referenced entity kind.
    pub entity_type: Option<String>,
    /// Referenced entity ID.
    pub entity_id: Option<String>,
}
