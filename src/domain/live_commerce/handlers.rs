use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::AppContext;
use crate::domain::catalog::Product;
use crate::domain::common::PagedResult;
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::Criteria;
use super::commands::*;
use super::dto::LiveStreamDto;
use super::errors::LiveCommerceError;
use super::model::LiveStream;
use super::queries::*;

pub struct LiveCommerceHandlers {
    ctx: AppContext,
}

impl LiveCommerceHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Load, apply `change` and save in one unit of work.
    async fn mutate<F>(&self, stream_id: Uuid, meta: &RequestMeta, change: F) -> Result<LiveStreamDto, AppError>
    where
        F: FnOnce(&mut LiveStream) -> Result<(), LiveCommerceError> + Send,
    {
        let mut stream = self.ctx.data.set::<LiveStream>().get(stream_id, "LiveStream").await?;
        change(&mut stream)?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut stream)?;
        uow.save_changes().await?;
        Ok(LiveStreamDto::from(&stream))
    }
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(LiveCommerceHandlers::new(ctx.clone()));
    builder.register::<ScheduleLiveStream>(handlers.clone());
    builder.register::<AddFeaturedProduct>(handlers.clone());
    builder.register::<PinProduct>(handlers.clone());
    builder.register::<StartLiveStream>(handlers.clone());
    builder.register::<EndLiveStream>(handlers.clone());
    builder.register::<CancelLiveStream>(handlers.clone());
    builder.register::<RecordViewerCount>(handlers.clone());
    builder.register::<GetLiveStream>(handlers.clone());
    builder.register::<ListLiveStreams>(handlers);
}

// ============================================================================
// Commands
// ============================================================================

#[async_trait]
impl RequestHandler<ScheduleLiveStream> for LiveCommerceHandlers {
    async fn handle(&self, request: &ScheduleLiveStream, meta: &RequestMeta) -> Result<LiveStreamDto, AppError> {
        let mut stream = LiveStream::schedule(
            request.seller_id,
            &request.title,
            request.scheduled_at,
            Utc::now(),
        )?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut stream)?;
        uow.save_changes().await?;

        tracing::info!(
            stream_id = %stream.base.id,
            seller_id = %stream.seller_id,
            scheduled_at = %stream.scheduled_at,
            "Live stream scheduled"
        );
        Ok(LiveStreamDto::from(&stream))
    }
}

#[async_trait]
impl RequestHandler<AddFeaturedProduct> for LiveCommerceHandlers {
    async fn handle(&self, request: &AddFeaturedProduct, meta: &RequestMeta) -> Result<LiveStreamDto, AppError> {
        let product = self
            .ctx
            .data
            .set::<Product>()
            .get(request.product_id, "Product")
            .await?;

        self.mutate(request.stream_id, meta, |stream| {
            if product.seller_id != stream.seller_id {
                return Err(LiveCommerceError::ProductNotOwned(product.base.id));
            }
            stream.add_featured_product(product.base.id)
        })
        .await
    }
}

#[async_trait]
impl RequestHandler<PinProduct> for LiveCommerceHandlers {
    async fn handle(&self, request: &PinProduct, meta: &RequestMeta) -> Result<LiveStreamDto, AppError> {
        self.mutate(request.stream_id, meta, |stream| stream.pin_product(request.product_id))
            .await
    }
}

#[async_trait]
impl RequestHandler<StartLiveStream> for LiveCommerceHandlers {
    async fn handle(&self, request: &StartLiveStream, meta: &RequestMeta) -> Result<LiveStreamDto, AppError> {
        let stream = self
            .mutate(request.stream_id, meta, |stream| stream.start(Utc::now()))
            .await?;
        tracing::info!(stream_id = %stream.id, "Live stream started");
        Ok(stream)
    }
}

#[async_trait]
impl RequestHandler<EndLiveStream> for LiveCommerceHandlers {
    async fn handle(&self, request: &EndLiveStream, meta: &RequestMeta) -> Result<LiveStreamDto, AppError> {
        let stream = self
            .mutate(request.stream_id, meta, |stream| stream.end(Utc::now()))
            .await?;
        tracing::info!(stream_id = %stream.id, peak_viewers = stream.peak_viewers, "Live stream ended");
        Ok(stream)
    }
}

#[async_trait]
impl RequestHandler<CancelLiveStream> for LiveCommerceHandlers {
    async fn handle(&self, request: &CancelLiveStream, meta: &RequestMeta) -> Result<LiveStreamDto, AppError> {
        self.mutate(request.stream_id, meta, LiveStream::cancel).await
    }
}

#[async_trait]
impl RequestHandler<RecordViewerCount> for LiveCommerceHandlers {
    async fn handle(&self, request: &RecordViewerCount, meta: &RequestMeta) -> Result<LiveStreamDto, AppError> {
        self.mutate(request.stream_id, meta, |stream| stream.record_viewer_count(request.viewers))
            .await
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetLiveStream> for LiveCommerceHandlers {
    async fn handle(&self, request: &GetLiveStream, _meta: &RequestMeta) -> Result<Option<LiveStreamDto>, AppError> {
        let stream = self.ctx.data.set::<LiveStream>().find(request.stream_id).await?;
        Ok(stream.as_ref().map(LiveStreamDto::from))
    }
}

#[async_trait]
impl RequestHandler<ListLiveStreams> for LiveCommerceHandlers {
    async fn handle(&self, request: &ListLiveStreams, _meta: &RequestMeta) -> Result<PagedResult<LiveStreamDto>, AppError> {
        let page = self.ctx.settings.page(request.page);
        let criteria = Criteria::new()
            .eq_opt("status", request.status)
            .eq_opt("seller_id", request.seller_id)
            .order_by("scheduled_at", false);

        let streams = self.ctx.data.set::<LiveStream>().paged(criteria, page).await?;
        Ok(streams.map(|s| LiveStreamDto::from(&s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{app, TestApp};
    use crate::domain::catalog::{CreateCategory, CreateProduct};
    use crate::domain::live_commerce::LiveStreamStatus;
    use chrono::Duration;

    async fn seed_product(app: &TestApp, seller_id: Uuid, sku: &str) -> Uuid {
        let category = app
            .mediator
            .send(CreateCategory {
                name: "Fashion".to_string(),
                slug: format!("fashion-{}", sku.to_lowercase()),
                parent_id: None,
            })
            .await
            .unwrap();
        app.mediator
            .send(CreateProduct {
                seller_id,
                category_id: category.id,
                name: "Jacket".to_string(),
                sku: sku.to_string(),
                description: None,
                price: 8_900,
                stock_quantity: 10,
            })
            .await
            .unwrap()
            .id
    }

    async fn schedule(app: &TestApp, seller_id: Uuid, hours: i64) -> LiveStreamDto {
        app.mediator
            .send(ScheduleLiveStream {
                seller_id,
                title: "Autumn collection".to_string(),
                scheduled_at: Utc::now() + Duration::hours(hours),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_schedule_in_past_is_a_validation_error() {
        let app = app();
        let err = app
            .mediator
            .send(ScheduleLiveStream {
                seller_id: Uuid::new_v4(),
                title: "Late".to_string(),
                scheduled_at: Utc::now() - Duration::minutes(1),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_live_session_flow() {
        let app = app();
        let seller = Uuid::new_v4();
        let product = seed_product(&app, seller, "JACKET-1").await;
        let stream = schedule(&app, seller, 1).await;

        app.mediator
            .send(AddFeaturedProduct {
                stream_id: stream.id,
                product_id: product,
            })
            .await
            .unwrap();
        app.mediator.send(StartLiveStream { stream_id: stream.id }).await.unwrap();
        let pinned = app
            .mediator
            .send(PinProduct {
                stream_id: stream.id,
                product_id: product,
            })
            .await
            .unwrap();
        assert_eq!(pinned.pinned_product_id, Some(product));

        for viewers in [40, 300, 120] {
            app.mediator
                .send(RecordViewerCount {
                    stream_id: stream.id,
                    viewers,
                })
                .await
                .unwrap();
        }
        let ended = app.mediator.send(EndLiveStream { stream_id: stream.id }).await.unwrap();
        assert_eq!(ended.status, LiveStreamStatus::Ended);
        assert_eq!(ended.peak_viewers, 300);
        assert!(ended.pinned_product_id.is_none());
    }

    #[tokio::test]
    async fn test_cannot_feature_another_sellers_product() {
        let app = app();
        let product = seed_product(&app, Uuid::new_v4(), "JACKET-2").await;
        let stream = schedule(&app, Uuid::new_v4(), 1).await;

        let err = app
            .mediator
            .send(AddFeaturedProduct {
                stream_id: stream.id,
                product_id: product,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_list_streams_by_status_in_schedule_order() {
        let app = app();
        let seller = Uuid::new_v4();
        let later = schedule(&app, seller, 5).await;
        let sooner = schedule(&app, seller, 2).await;
        let cancelled = schedule(&app, seller, 3).await;
        app.mediator
            .send(CancelLiveStream { stream_id: cancelled.id })
            .await
            .unwrap();

        let scheduled = app
            .mediator
            .send(ListLiveStreams {
                status: Some(LiveStreamStatus::Scheduled),
                seller_id: Some(seller),
                page: None,
            })
            .await
            .unwrap();
        let ids: Vec<Uuid> = scheduled.items.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);
    }
}
