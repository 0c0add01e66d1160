use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::guard;
use crate::persistence::{Entity, EntityBase};
use super::errors::NotificationError;
use super::events::NotificationEvent;

pub const TITLE_MAX: usize = 200;
pub const BODY_MAX: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
    InApp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(flatten)]
    pub base: EntityBase,
    pub user_id: Uuid,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    events: Vec<NotificationEvent>,
}

impl Notification {
    pub fn send(
        user_id: Uuid,
        channel: NotificationChannel,
        title: &str,
        body: &str,
    ) -> Result<Self, NotificationError> {
        let user_id = guard::not_nil(user_id, "user_id")?;
        let title = guard::text(title, TITLE_MAX, "title")?;
        let body = guard::text(body, BODY_MAX, "body")?;

        let base = EntityBase::new();
        let events = vec![NotificationEvent::NotificationSent {
            notification_id: base.id,
            user_id,
            channel,
            title: title.clone(),
        }];

        Ok(Self {
            base,
            user_id,
            channel,
            title,
            body,
            is_read: false,
            read_at: None,
            events,
        })
    }

    /// Returns `false` when the notification was already read.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(now);
        self.base.touch();
        self.events.push(NotificationEvent::NotificationRead {
            notification_id: self.base.id,
            user_id: self.user_id,
        });
        true
    }

    pub fn mark_as_deleted(&mut self) -> bool {
        if !self.base.mark_deleted() {
            return false;
        }
        self.events.push(NotificationEvent::NotificationDeleted {
            notification_id: self.base.id,
        });
        true
    }
}

impl Entity for Notification {
    type Event = NotificationEvent;
    const KIND: &'static str = "notification";
    const TOPIC: &'static str = "notification-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<NotificationEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_read_once() {
        let mut n = Notification::send(Uuid::new_v4(), NotificationChannel::InApp, "Shipped", "On its way").unwrap();
        n.take_events();
        assert!(n.mark_read(Utc::now()));
        let read_at = n.read_at;
        assert!(!n.mark_read(Utc::now()));
        assert_eq!(n.read_at, read_at);
        assert_eq!(n.take_events().len(), 1);
    }

    #[test]
    fn test_blank_body_rejected() {
        assert!(matches!(
            Notification::send(Uuid::new_v4(), NotificationChannel::Email, "Hi", "  "),
            Err(NotificationError::Guard(_))
        ));
    }
}
