use uuid::Uuid;

use crate::domain::common::guard;
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::NotificationDto;
use super::model::{NotificationChannel, BODY_MAX, TITLE_MAX};

#[derive(Debug, Clone)]
pub struct SendNotification {
    pub user_id: Uuid,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
}

request!(SendNotification => NotificationDto, Command);

impl Validate for SendNotification {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.user_id, "user_id"))
            .guard(guard::text(&self.title, TITLE_MAX, "title"))
            .guard(guard::text(&self.body, BODY_MAX, "body"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct MarkNotificationRead {
    pub notification_id: Uuid,
}

request!(MarkNotificationRead => NotificationDto, Command);

impl Validate for MarkNotificationRead {}

/// Returns the number of notifications that changed.
#[derive(Debug, Clone)]
pub struct MarkAllNotificationsRead {
    pub user_id: Uuid,
}

request!(MarkAllNotificationsRead => u64, Command);

impl Validate for MarkAllNotificationsRead {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.user_id, "user_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DeleteNotification {
    pub notification_id: Uuid,
}

request!(DeleteNotification => bool, Command);

impl Validate for DeleteNotification {}
