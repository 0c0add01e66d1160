use crate::domain::common::{PageRequest, PagedResult};
use crate::mediator::Validate;
use crate::request;
use super::dto::PageDto;
use super::model::PageStatus;

#[derive(Debug, Clone)]
pub struct GetPublishedPageBySlug {
    pub slug: String,
}

request!(GetPublishedPageBySlug => Option<PageDto>, Query);

impl Validate for GetPublishedPageBySlug {}

#[derive(Debug, Clone, Default)]
pub struct ListPages {
    pub status: Option<PageStatus>,
    pub page: Option<PageRequest>,
}

request!(ListPages => PagedResult<PageDto>, Query);

impl Validate for ListPages {}
