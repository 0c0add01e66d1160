use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::AppContext;
use crate::domain::common::PagedResult;
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::Criteria;
use super::commands::*;
use super::dto::NotificationDto;
use super::model::Notification;
use super::queries::*;

const UNREAD_KEY: &str = "notifications:unread:";

fn unread_key(user_id: Uuid) -> String {
    format!("{}{}", UNREAD_KEY, user_id)
}

pub struct NotificationHandlers {
    ctx: AppContext,
}

impl NotificationHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    async fn save(&self, mut notification: Notification, meta: &RequestMeta) -> Result<NotificationDto, AppError> {
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut notification)?;
        uow.save_changes().await?;
        self.ctx.cache.invalidate(&unread_key(notification.user_id)).await;
        Ok(NotificationDto::from(&notification))
    }
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(NotificationHandlers::new(ctx.clone()));
    builder.register::<SendNotification>(handlers.clone());
    builder.register::<MarkNotificationRead>(handlers.clone());
    builder.register::<MarkAllNotificationsRead>(handlers.clone());
    builder.register::<DeleteNotification>(handlers.clone());
    builder.register::<ListNotifications>(handlers.clone());
    builder.register::<GetUnreadCount>(handlers);
}

// ============================================================================
// Commands
// ============================================================================

#[async_trait]
impl RequestHandler<SendNotification> for NotificationHandlers {
    async fn handle(&self, request: &SendNotification, meta: &RequestMeta) -> Result<NotificationDto, AppError> {
        let mut notification = Notification::send(
            request.user_id,
            request.channel,
            &request.title,
            &request.body,
        )?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut notification)?;
        uow.save_changes().await?;
        self.ctx.cache.invalidate(&unread_key(notification.user_id)).await;

        tracing::debug!(
            notification_id = %notification.base.id,
            user_id = %notification.user_id,
            channel = ?notification.channel,
            "Notification sent"
        );
        Ok(NotificationDto::from(&notification))
    }
}

#[async_trait]
impl RequestHandler<MarkNotificationRead> for NotificationHandlers {
    async fn handle(&self, request: &MarkNotificationRead, meta: &RequestMeta) -> Result<NotificationDto, AppError> {
        let mut notification = self
            .ctx
            .data
            .set::<Notification>()
            .get(request.notification_id, "Notification")
            .await?;
        if !notification.mark_read(Utc::now()) {
            return Ok(NotificationDto::from(&notification));
        }
        self.save(notification, meta).await
    }
}

#[async_trait]
impl RequestHandler<MarkAllNotificationsRead> for NotificationHandlers {
    async fn handle(&self, request: &MarkAllNotificationsRead, meta: &RequestMeta) -> Result<u64, AppError> {
        let mut unread = self
            .ctx
            .data
            .set::<Notification>()
            .all(
                Criteria::new()
                    .eq("user_id", request.user_id)
                    .eq("is_read", false),
            )
            .await?;
        if unread.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        let mut changed = 0u64;
        for notification in unread.iter_mut() {
            if notification.mark_read(now) {
                uow.update(notification)?;
                changed += 1;
            }
        }
        uow.save_changes().await?;
        self.ctx.cache.invalidate(&unread_key(request.user_id)).await;

        tracing::debug!(user_id = %request.user_id, changed, "Marked all notifications read");
        Ok(changed)
    }
}

#[async_trait]
impl RequestHandler<DeleteNotification> for NotificationHandlers {
    async fn handle(&self, request: &DeleteNotification, meta: &RequestMeta) -> Result<bool, AppError> {
        let Some(mut notification) = self
            .ctx
            .data
            .set::<Notification>()
            .find(request.notification_id)
            .await?
        else {
            return Ok(false);
        };
        if !notification.mark_as_deleted() {
            return Ok(false);
        }
        self.save(notification, meta).await?;
        Ok(true)
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<ListNotifications> for NotificationHandlers {
    async fn handle(&self, request: &ListNotifications, _meta: &RequestMeta) -> Result<PagedResult<NotificationDto>, AppError> {
        let page = self.ctx.settings.page(request.page);
        let mut criteria = Criteria::new().eq("user_id", request.user_id).newest_first();
        if request.unread_only {
            criteria = criteria.eq("is_read", false);
        }

        let notifications = self.ctx.data.set::<Notification>().paged(criteria, page).await?;
        Ok(notifications.map(|n| NotificationDto::from(&n)))
    }
}

#[async_trait]
impl RequestHandler<GetUnreadCount> for NotificationHandlers {
    async fn handle(&self, request: &GetUnreadCount, _meta: &RequestMeta) -> Result<u64, AppError> {
        let notifications = self.ctx.data.set::<Notification>();
        let criteria = Criteria::new()
            .eq("user_id", request.user_id)
            .eq("is_read", false);

        self.ctx
            .cache
            .get_or_create(&unread_key(request.user_id), None, || async move {
                Ok::<_, AppError>(notifications.count(criteria).await?)
            })
            .await
    }
}
