use uuid::Uuid;

use crate::domain::common::{PageRequest, PagedResult};
use crate::mediator::Validate;
use crate::request;
use super::dto::LiveStreamDto;
use super::model::LiveStreamStatus;

#[derive(Debug, Clone)]
pub struct GetLiveStream {
    pub stream_id: Uuid,
}

request!(GetLiveStream => Option<LiveStreamDto>, Query);

impl Validate for GetLiveStream {}

#[derive(Debug, Clone, Default)]
pub struct ListLiveStreams {
    pub status: Option<LiveStreamStatus>,
    pub seller_id: Option<Uuid>,
    pub page: Option<PageRequest>,
}

request!(ListLiveStreams => PagedResult<LiveStreamDto>, Query);

impl Validate for ListLiveStreams {}
