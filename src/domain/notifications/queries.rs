use uuid::Uuid;

use crate::domain::common::{PageRequest, PagedResult};
use crate::mediator::Validate;
use crate::request;
use super::dto::NotificationDto;

#[derive(Debug, Clone)]
pub struct ListNotifications {
    pub user_id: Uuid,
    pub unread_only: bool,
    pub page: Option<PageRequest>,
}

request!(ListNotifications => PagedResult<NotificationDto>, Query);

impl Validate for ListNotifications {}

#[derive(Debug, Clone)]
pub struct GetUnreadCount {
    pub user_id: Uuid,
}

request!(GetUnreadCount => u64, Query);

impl Validate for GetUnreadCount {}
