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
use super::dto::PageDto;
use super::errors::ContentError;
use super::model::{Page, PageStatus};
use super::queries::*;

const PUBLISHED_KEY: &str = "content:page:";

fn published_key(slug: &str) -> String {
    format!("{}{}", PUBLISHED_KEY, slug)
}

pub struct ContentHandlers {
    ctx: AppContext,
}

impl ContentHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    async fn load(&self, page_id: Uuid) -> Result<Page, AppError> {
        self.ctx.data.set::<Page>().get(page_id, "Page").await
    }

    /// Save and drop the cached published copy.
    async fn save(&self, mut page: Page, meta: &RequestMeta) -> Result<PageDto, AppError> {
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut page)?;
        uow.save_changes().await?;
        self.ctx.cache.invalidate(&published_key(&page.slug)).await;
        Ok(PageDto::from(&page))
    }
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(ContentHandlers::new(ctx.clone()));
    builder.register::<CreatePage>(handlers.clone());
    builder.register::<UpdatePage>(handlers.clone());
    builder.register::<PublishPage>(handlers.clone());
    builder.register::<UnpublishPage>(handlers.clone());
    builder.register::<ArchivePage>(handlers.clone());
    builder.register::<DeletePage>(handlers.clone());
    builder.register::<GetPublishedPageBySlug>(handlers.clone());
    builder.register::<ListPages>(handlers);
}

// ============================================================================
// Commands
// ============================================================================

#[async_trait]
impl RequestHandler<CreatePage> for ContentHandlers {
    async fn handle(&self, request: &CreatePage, meta: &RequestMeta) -> Result<PageDto, AppError> {
        let mut page = Page::create(
            &request.title,
            &request.slug,
            &request.body,
            request.seo_description.as_deref(),
        )?;

        let slug_taken = self
            .ctx
            .data
            .set::<Page>()
            .exists(Criteria::new().eq("slug", &page.slug).include_deleted())
            .await?;
        if slug_taken {
            return Err(ContentError::DuplicateSlug(page.slug).into());
        }

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut page)?;
        uow.save_changes().await?;

        tracing::info!(page_id = %page.base.id, slug = %page.slug, "Page created");
        Ok(PageDto::from(&page))
    }
}

#[async_trait]
impl RequestHandler<UpdatePage> for ContentHandlers {
    async fn handle(&self, request: &UpdatePage, meta: &RequestMeta) -> Result<PageDto, AppError> {
        let mut page = self.load(request.page_id).await?;
        page.update(&request.title, &request.body, request.seo_description.as_deref())?;
        self.save(page, meta).await
    }
}

#[async_trait]
impl RequestHandler<PublishPage> for ContentHandlers {
    async fn handle(&self, request: &PublishPage, meta: &RequestMeta) -> Result<PageDto, AppError> {
        let mut page = self.load(request.page_id).await?;
        page.publish(Utc::now())?;
        tracing::info!(page_id = %page.base.id, slug = %page.slug, "Page published");
        self.save(page, meta).await
    }
}

#[async_trait]
impl RequestHandler<UnpublishPage> for ContentHandlers {
    async fn handle(&self, request: &UnpublishPage, meta: &RequestMeta) -> Result<PageDto, AppError> {
        let mut page = self.load(request.page_id).await?;
        page.unpublish()?;
        self.save(page, meta).await
    }
}

#[async_trait]
impl RequestHandler<ArchivePage> for ContentHandlers {
    async fn handle(&self, request: &ArchivePage, meta: &RequestMeta) -> Result<PageDto, AppError> {
        let mut page = self.load(request.page_id).await?;
        page.archive();
        self.save(page, meta).await
    }
}

#[async_trait]
impl RequestHandler<DeletePage> for ContentHandlers {
    async fn handle(&self, request: &DeletePage, meta: &RequestMeta) -> Result<bool, AppError> {
        let Some(mut page) = self.ctx.data.set::<Page>().find(request.page_id).await? else {
            return Ok(false);
        };
        if !page.mark_as_deleted() {
            return Ok(false);
        }
        self.save(page, meta).await?;
        tracing::info!(page_id = %request.page_id, "Page deleted");
        Ok(true)
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetPublishedPageBySlug> for ContentHandlers {
    async fn handle(&self, request: &GetPublishedPageBySlug, _meta: &RequestMeta) -> Result<Option<PageDto>, AppError> {
        let slug = request.slug.trim().to_lowercase();
        let pages = self.ctx.data.set::<Page>();
        let criteria = Criteria::new()
            .eq("slug", &slug)
            .eq("status", PageStatus::Published);

        self.ctx
            .cache
            .get_or_create(&published_key(&slug), None, || async move {
                Ok::<_, AppError>(pages.first(criteria).await?.as_ref().map(PageDto::from))
            })
            .await
    }
}

#[async_trait]
impl RequestHandler<ListPages> for ContentHandlers {
    async fn handle(&self, request: &ListPages, _meta: &RequestMeta) -> Result<PagedResult<PageDto>, AppError> {
        let page = self.ctx.settings.page(request.page);
        let criteria = Criteria::new()
            .eq_opt("status", request.status)
            .order_by("title", false);

        let pages = self.ctx.data.set::<Page>().paged(criteria, page).await?;
        Ok(pages.map(|p| PageDto::from(&p)))
    }
}
