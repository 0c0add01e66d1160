use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::AppContext;
use crate::domain::common::PagedResult;
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::Criteria;
use super::commands::*;
use super::dto::{CategoryDto, ProductDto};
use super::errors::CatalogError;
use super::model::{Category, NewProduct, Product};
use super::queries::*;

// ============================================================================
// Catalog Handlers
// ============================================================================
//
// Product reads are cached; every product write invalidates the product key
// and the product list prefix after a successful save.
//
// ============================================================================

const PRODUCT_KEY: &str = "catalog:product:";
const PRODUCT_LIST_PREFIX: &str = "catalog:products:";

pub fn product_cache_key(product_id: Uuid) -> String {
    format!("{}{}", PRODUCT_KEY, product_id)
}

pub struct CatalogHandlers {
    ctx: AppContext,
}

impl CatalogHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    async fn load_product(&self, product_id: Uuid) -> Result<Product, AppError> {
        self.ctx.data.set::<Product>().get(product_id, "Product").await
    }

    /// Stage, save and invalidate; returns the fresh DTO.
    async fn save_product(&self, mut product: Product, meta: &RequestMeta) -> Result<ProductDto, AppError> {
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut product)?;
        uow.save_changes().await?;
        invalidate_product(&self.ctx, product.base.id).await;
        Ok(ProductDto::from(&product))
    }
}

/// Drop cached reads for a product; also used by ordering after stock moves.
pub async fn invalidate_product(ctx: &AppContext, product_id: Uuid) {
    ctx.cache.invalidate(&product_cache_key(product_id)).await;
    ctx.cache.invalidate_prefix(PRODUCT_LIST_PREFIX).await;
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(CatalogHandlers::new(ctx.clone()));
    builder.register::<CreateCategory>(handlers.clone());
    builder.register::<CreateProduct>(handlers.clone());
    builder.register::<UpdateProductDetails>(handlers.clone());
    builder.register::<ChangeProductPrice>(handlers.clone());
    builder.register::<AdjustStock>(handlers.clone());
    builder.register::<ActivateProduct>(handlers.clone());
    builder.register::<DeactivateProduct>(handlers.clone());
    builder.register::<DeleteProduct>(handlers.clone());
    builder.register::<GetProductById>(handlers.clone());
    builder.register::<ListProducts>(handlers.clone());
    builder.register::<ListCategories>(handlers);
}

// ============================================================================
// Commands
// ============================================================================

#[async_trait]
impl RequestHandler<CreateCategory> for CatalogHandlers {
    async fn handle(&self, request: &CreateCategory, meta: &RequestMeta) -> Result<CategoryDto, AppError> {
        let categories = self.ctx.data.set::<Category>();

        let mut category = Category::create(&request.name, &request.slug, request.parent_id)?;
        if categories
            .exists(Criteria::new().eq("slug", &category.slug).include_deleted())
            .await?
        {
            return Err(CatalogError::DuplicateSlug(category.slug).into());
        }
        if let Some(parent_id) = request.parent_id {
            categories.get(parent_id, "Category").await?;
        }

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut category)?;
        uow.save_changes().await?;

        tracing::info!(category_id = %category.base.id, slug = %category.slug, "Category created");
        Ok(CategoryDto::from(&category))
    }
}

#[async_trait]
impl RequestHandler<CreateProduct> for CatalogHandlers {
    async fn handle(&self, request: &CreateProduct, meta: &RequestMeta) -> Result<ProductDto, AppError> {
        let category = self
            .ctx
            .data
            .set::<Category>()
            .get(request.category_id, "Category")
            .await?;
        if !category.is_active {
            return Err(CatalogError::CategoryInactive(category.base.id).into());
        }

        let mut product = Product::create(NewProduct {
            seller_id: request.seller_id,
            category_id: request.category_id,
            name: &request.name,
            sku: &request.sku,
            description: request.description.as_deref(),
            price: request.price,
            stock_quantity: request.stock_quantity,
        })?;

        // SKUs stay reserved after soft delete.
        let sku_taken = self
            .ctx
            .data
            .set::<Product>()
            .exists(Criteria::new().eq("sku", &product.sku).include_deleted())
            .await?;
        if sku_taken {
            return Err(CatalogError::DuplicateSku(product.sku).into());
        }

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut product)?;
        uow.save_changes().await?;
        self.ctx.cache.invalidate_prefix(PRODUCT_LIST_PREFIX).await;

        tracing::info!(product_id = %product.base.id, sku = %product.sku, "Product created");
        Ok(ProductDto::from(&product))
    }
}

#[async_trait]
impl RequestHandler<UpdateProductDetails> for CatalogHandlers {
    async fn handle(&self, request: &UpdateProductDetails, meta: &RequestMeta) -> Result<ProductDto, AppError> {
        let mut product = self.load_product(request.product_id).await?;
        product.update_details(&request.name, request.description.as_deref())?;
        self.save_product(product, meta).await
    }
}

#[async_trait]
impl RequestHandler<ChangeProductPrice> for CatalogHandlers {
    async fn handle(&self, request: &ChangeProductPrice, meta: &RequestMeta) -> Result<ProductDto, AppError> {
        let mut product = self.load_product(request.product_id).await?;
        product.change_price(request.price)?;
        self.save_product(product, meta).await
    }
}

#[async_trait]
impl RequestHandler<AdjustStock> for CatalogHandlers {
    async fn handle(&self, request: &AdjustStock, meta: &RequestMeta) -> Result<ProductDto, AppError> {
        let mut product = self.load_product(request.product_id).await?;
        product.adjust_stock(request.delta)?;
        tracing::debug!(
            product_id = %product.base.id,
            delta = request.delta,
            stock = product.stock_quantity,
            "Stock adjusted"
        );
        self.save_product(product, meta).await
    }
}

#[async_trait]
impl RequestHandler<ActivateProduct> for CatalogHandlers {
    async fn handle(&self, request: &ActivateProduct, meta: &RequestMeta) -> Result<ProductDto, AppError> {
        let mut product = self.load_product(request.product_id).await?;
        product.activate()?;
        self.save_product(product, meta).await
    }
}

#[async_trait]
impl RequestHandler<DeactivateProduct> for CatalogHandlers {
    async fn handle(&self, request: &DeactivateProduct, meta: &RequestMeta) -> Result<ProductDto, AppError> {
        let mut product = self.load_product(request.product_id).await?;
        product.deactivate();
        self.save_product(product, meta).await
    }
}

#[async_trait]
impl RequestHandler<DeleteProduct> for CatalogHandlers {
    async fn handle(&self, request: &DeleteProduct, meta: &RequestMeta) -> Result<bool, AppError> {
        let Some(mut product) = self.ctx.data.set::<Product>().find(request.product_id).await? else {
            return Ok(false);
        };
        if !product.mark_as_deleted() {
            return Ok(false);
        }
        self.save_product(product, meta).await?;
        tracing::info!(product_id = %request.product_id, "Product deleted");
        Ok(true)
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetProductById> for CatalogHandlers {
    async fn handle(&self, request: &GetProductById, _meta: &RequestMeta) -> Result<Option<ProductDto>, AppError> {
        let products = self.ctx.data.set::<Product>();
        let product_id = request.product_id;

        self.ctx
            .cache
            .get_or_create(&product_cache_key(product_id), None, || async move {
                Ok::<_, AppError>(products.find(product_id).await?.as_ref().map(ProductDto::from))
            })
            .await
    }
}

#[async_trait]
impl RequestHandler<ListProducts> for CatalogHandlers {
    async fn handle(&self, request: &ListProducts, _meta: &RequestMeta) -> Result<PagedResult<ProductDto>, AppError> {
        let page = self.ctx.settings.page(request.page);
        let key = format!(
            "{}{}:{}:{}:{}:{}",
            PRODUCT_LIST_PREFIX,
            request.category_id.map(|id| id.to_string()).unwrap_or_default(),
            request.seller_id.map(|id| id.to_string()).unwrap_or_default(),
            request.active_only,
            page.page,
            page.page_size,
        );

        let mut criteria = Criteria::new()
            .eq_opt("category_id", request.category_id)
            .eq_opt("seller_id", request.seller_id)
            .order_by("name", false);
        if request.active_only {
            criteria = criteria.eq("is_active", true);
        }
        let products = self.ctx.data.set::<Product>();

        self.ctx
            .cache
            .get_or_create(&key, None, || async move {
                let result = products.paged(criteria, page).await?;
                Ok::<_, AppError>(result.map(|p| ProductDto::from(&p)))
            })
            .await
    }
}

#[async_trait]
impl RequestHandler<ListCategories> for CatalogHandlers {
    async fn handle(&self, request: &ListCategories, _meta: &RequestMeta) -> Result<Vec<CategoryDto>, AppError> {
        let mut criteria = Criteria::new()
            .eq_opt("parent_id", request.parent_id)
            .order_by("name", false);
        if request.active_only {
            criteria = criteria.eq("is_active", true);
        }

        let categories = self.ctx.data.set::<Category>().all(criteria).await?;
        Ok(categories.iter().map(CategoryDto::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{app, TestApp};
    use crate::domain::common::PageRequest;

    async fn seed_category(app: &TestApp, slug: &str) -> CategoryDto {
        app.mediator
            .send(CreateCategory {
                name: slug.to_uppercase(),
                slug: slug.to_string(),
                parent_id: None,
            })
            .await
            .unwrap()
    }

    fn create_product(category_id: Uuid, sku: &str, stock: i32) -> CreateProduct {
        CreateProduct {
            seller_id: Uuid::new_v4(),
            category_id,
            name: format!("Product {}", sku),
            sku: sku.to_string(),
            description: None,
            price: 1_999,
            stock_quantity: stock,
        }
    }

    #[tokio::test]
    async fn test_create_product_writes_outbox_event() {
        let app = app();
        let category = seed_category(&app, "tools").await;

        let product = app
            .mediator
            .send(create_product(category.id, "hammer-1", 5))
            .await
            .unwrap();

        assert_eq!(product.sku, "HAMMER-1");
        assert!(product.in_stock);
        assert_eq!(
            app.outbox_event_types().await,
            vec!["CategoryCreated", "ProductCreated"]
        );
    }

    #[tokio::test]
    async fn test_duplicate_sku_and_slug_are_rejected() {
        let app = app();
        let category = seed_category(&app, "tools").await;
        app.mediator.send(create_product(category.id, "SKU-1", 1)).await.unwrap();

        let err = app
            .mediator
            .send(create_product(category.id, "sku-1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(msg) if msg.contains("SKU-1")));

        let err = app
            .mediator
            .send(CreateCategory {
                name: "Tools".to_string(),
                slug: "tools".to_string(),
                parent_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_concurrent_creates_cannot_share_a_sku() {
        let app = app();
        let category = seed_category(&app, "garden").await;

        let (first, second) = tokio::join!(
            app.mediator.send(create_product(category.id, "RAKE-1", 1)),
            app.mediator.send(create_product(category.id, "rake-1", 1)),
        );

        let results = [first, second];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(Result::err).unwrap();
        assert!(matches!(err, AppError::BusinessRule(msg) if msg.contains("RAKE-1")));
        assert_eq!(app.store.entity_count("product").await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_cannot_share_a_slug() {
        let app = app();
        let create = || CreateCategory {
            name: "Garden".to_string(),
            slug: "garden".to_string(),
            parent_id: None,
        };

        let (first, second) = tokio::join!(app.mediator.send(create()), app.mediator.send(create()));

        assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(app.store.entity_count("category").await, 1);
    }

    #[tokio::test]
    async fn test_create_product_requires_category() {
        let app = app();
        let err = app
            .mediator
            .send(create_product(Uuid::new_v4(), "X", 1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_input() {
        let app = app();
        let mut request = create_product(Uuid::nil(), "", -1);
        request.price = -5;

        match app.mediator.send(request).await.unwrap_err() {
            AppError::Validation(errors) => {
                assert!(errors.has_field("category_id"));
                assert!(errors.has_field("sku"));
                assert!(errors.has_field("price"));
                assert!(errors.has_field("stock_quantity"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cached_product_is_invalidated_by_writes() {
        let app = app();
        let category = seed_category(&app, "tools").await;
        let product = app.mediator.send(create_product(category.id, "A", 1)).await.unwrap();

        let cached = app
            .mediator
            .send(GetProductById { product_id: product.id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached.price, 1_999);

        app.mediator
            .send(ChangeProductPrice { product_id: product.id, price: 2_499 })
            .await
            .unwrap();
        let fresh = app
            .mediator
            .send(GetProductById { product_id: product.id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.price, 2_499);
        assert_eq!(app.ctx.cache.stats().hits, 0);
    }

    #[tokio::test]
    async fn test_adjust_stock_rejects_negative_result() {
        let app = app();
        let category = seed_category(&app, "tools").await;
        let product = app.mediator.send(create_product(category.id, "A", 2)).await.unwrap();

        let updated = app
            .mediator
            .send(AdjustStock { product_id: product.id, delta: -2 })
            .await
            .unwrap();
        assert_eq!(updated.stock_quantity, 0);
        assert!(!updated.in_stock);

        let err = app
            .mediator
            .send(AdjustStock { product_id: product.id, delta: -1 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_products_are_hidden() {
        let app = app();
        let category = seed_category(&app, "tools").await;
        let keep = app.mediator.send(create_product(category.id, "KEEP", 1)).await.unwrap();
        let gone = app.mediator.send(create_product(category.id, "GONE", 1)).await.unwrap();

        assert!(app.mediator.send(DeleteProduct { product_id: gone.id }).await.unwrap());
        assert!(!app.mediator.send(DeleteProduct { product_id: gone.id }).await.unwrap());

        assert!(app
            .mediator
            .send(GetProductById { product_id: gone.id })
            .await
            .unwrap()
            .is_none());

        let listed = app
            .mediator
            .send(ListProducts {
                category_id: Some(category.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.total_count, 1);
        assert_eq!(listed.items[0].id, keep.id);
    }

    #[tokio::test]
    async fn test_list_products_filters_and_pages() {
        let app = app();
        let category = seed_category(&app, "tools").await;
        for i in 0..5 {
            app.mediator
                .send(create_product(category.id, &format!("P{}", i), 1))
                .await
                .unwrap();
        }
        let inactive = app.mediator.send(create_product(category.id, "OFF", 1)).await.unwrap();
        app.mediator
            .send(DeactivateProduct { product_id: inactive.id })
            .await
            .unwrap();

        let page = app
            .mediator
            .send(ListProducts {
                category_id: Some(category.id),
                active_only: true,
                page: Some(PageRequest::new(2, 2)),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next_page());
    }

    #[tokio::test]
    async fn test_list_categories() {
        let app = app();
        let parent = seed_category(&app, "home").await;
        app.mediator
            .send(CreateCategory {
                name: "Lighting".to_string(),
                slug: "lighting".to_string(),
                parent_id: Some(parent.id),
            })
            .await
            .unwrap();

        let all = app.mediator.send(ListCategories::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let children = app
            .mediator
            .send(ListCategories {
                parent_id: Some(parent.id),
                active_only: true,
            })
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].slug, "lighting");
    }
}
