use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{Notification, NotificationChannel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Notification> for NotificationDto {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.base.id,
            user_id: n.user_id,
            channel: n.channel,
            title: n.title.clone(),
            body: n.body.clone(),
            is_read: n.is_read,
            read_at: n.read_at,
            created_at: n.base.created_at,
        }
    }
}
