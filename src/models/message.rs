use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Inbox row with the other party's display name.
#[derive(Debug, Clone, Serialize)]
pub struct MessageListing {
    pub message: Message,
    pub sender_name: Option<String>,
    pub recipient_name: Option<String>,
}
