use serde::Serialize;
use uuid::Uuid;

use crate::persistence::DomainEvent;
use super::model::NotificationChannel;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum NotificationEvent {
    NotificationSent {
        notification_id: Uuid,
        user_id: Uuid,
        channel: NotificationChannel,
        title: String,
    },
    NotificationRead {
        notification_id: Uuid,
        user_id: Uuid,
    },
    NotificationDeleted {
        notification_id: Uuid,
    },
}

impl DomainEvent for NotificationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::NotificationSent { .. } => "NotificationSent",
            Self::NotificationRead { .. } => "NotificationRead",
            Self::NotificationDeleted { .. } => "NotificationDeleted",
        }
    }
}
