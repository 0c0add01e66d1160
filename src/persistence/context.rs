use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::common::{PageRequest, PagedResult};
use crate::error::AppError;
use super::entity::Entity;
use super::record::{Criteria, StoredRecord};
use super::store::EntityStore;
use super::unit_of_work::UnitOfWork;

// ============================================================================
// Data Context - typed access to the entity store
// ============================================================================

#[derive(Clone)]
pub struct DataContext {
    store: Arc<dyn EntityStore>,
}

impl DataContext {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Typed repository for one entity kind.
    pub fn set<E: Entity>(&self) -> Repository<E> {
        Repository {
            store: self.store.clone(),
            _entity: PhantomData,
        }
    }

    /// Start a unit of work; events staged in it carry the correlation id.
    pub fn begin(&self, correlation_id: Uuid) -> UnitOfWork {
        UnitOfWork::new(self.store.clone(), correlation_id)
    }
}

pub struct Repository<E> {
    store: Arc<dyn EntityStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Repository<E> {
    pub async fn find(&self, id: Uuid) -> Result<Option<E>, AppError> {
        self.store
            .find(E::KIND, id, false)
            .await?
            .map(hydrate)
            .transpose()
    }

    /// Bypasses the soft-delete filter.
    pub async fn find_including_deleted(&self, id: Uuid) -> Result<Option<E>, AppError> {
        self.store
            .find(E::KIND, id, true)
            .await?
            .map(hydrate)
            .transpose()
    }

    /// Like `find`, but a missing entity is an error.
    pub async fn get(&self, id: Uuid, entity_name: &'static str) -> Result<E, AppError> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::not_found(entity_name, id))
    }

    /// Matching entities and the total match count ignoring offset/limit.
    pub async fn list(&self, criteria: &Criteria) -> Result<(Vec<E>, u64), AppError> {
        let result = self.store.query(E::KIND, criteria).await?;
        let items = result
            .records
            .into_iter()
            .map(hydrate)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((items, result.total))
    }

    pub async fn paged(
        &self,
        criteria: Criteria,
        page: PageRequest,
    ) -> Result<PagedResult<E>, AppError> {
        let (items, total) = self.list(&criteria.page(page)).await?;
        Ok(PagedResult::new(items, total, page))
    }

    pub async fn all(&self, criteria: Criteria) -> Result<Vec<E>, AppError> {
        let (items, _) = self.list(&criteria).await?;
        Ok(items)
    }

    pub async fn first(&self, criteria: Criteria) -> Result<Option<E>, AppError> {
        let (items, _) = self.list(&criteria.limit(1)).await?;
        Ok(items.into_iter().next())
    }

    pub async fn exists(&self, criteria: Criteria) -> Result<bool, AppError> {
        Ok(self.count(criteria).await? > 0)
    }

    pub async fn count(&self, criteria: Criteria) -> Result<u64, AppError> {
        let result = self.store.query(E::KIND, &criteria.limit(1)).await?;
        Ok(result.total)
    }
}

/// Storage columns are authoritative for version and soft-delete state.
fn hydrate<E: Entity>(record: StoredRecord) -> Result<E, AppError> {
    let mut entity: E = serde_json::from_value(record.data)?;
    let base = entity.base_mut();
    base.version = record.version;
    base.is_deleted = record.is_deleted;
    Ok(entity)
}
