use uuid::Uuid;

use crate::domain::common::{PageRequest, PagedResult};
use crate::mediator::Validate;
use crate::request;
use super::dto::{SellerDto, StoreDto};
use super::model::SellerStatus;

#[derive(Debug, Clone)]
pub struct GetSellerById {
    pub seller_id: Uuid,
}

request!(GetSellerById => Option<SellerDto>, Query);

impl Validate for GetSellerById {}

#[derive(Debug, Clone, Default)]
pub struct ListSellers {
    pub status: Option<SellerStatus>,
    pub page: Option<PageRequest>,
}

request!(ListSellers => PagedResult<SellerDto>, Query);

impl Validate for ListSellers {}

#[derive(Debug, Clone)]
pub struct ListSellerStores {
    pub seller_id: Uuid,
    pub include_closed: bool,
}

request!(ListSellerStores => Vec<StoreDto>, Query);

impl Validate for ListSellerStores {}
