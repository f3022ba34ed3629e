use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload of the unread-count endpoint.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct UnreadCount {
    pub count: u64,
}
