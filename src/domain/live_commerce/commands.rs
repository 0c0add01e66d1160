use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::common::guard;
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::LiveStreamDto;
use super::model::TITLE_MAX;

// ============================================================================
// Live Stream Commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct ScheduleLiveStream {
    pub seller_id: Uuid,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
}

request!(ScheduleLiveStream => LiveStreamDto, Command);

impl Validate for ScheduleLiveStream {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.seller_id, "seller_id"))
            .guard(guard::text(&self.title, TITLE_MAX, "title"))
            .check(
                self.scheduled_at > Utc::now(),
                "scheduled_at",
                "scheduled_at must be in the future",
            )
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AddFeaturedProduct {
    pub stream_id: Uuid,
    pub product_id: Uuid,
}

request!(AddFeaturedProduct => LiveStreamDto, Command);

impl Validate for AddFeaturedProduct {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.stream_id, "stream_id"))
            .guard(guard::not_nil(self.product_id, "product_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct PinProduct {
    pub stream_id: Uuid,
    pub product_id: Uuid,
}

request!(PinProduct => LiveStreamDto, Command);

impl Validate for PinProduct {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.stream_id, "stream_id"))
            .guard(guard::not_nil(self.product_id, "product_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StartLiveStream {
    pub stream_id: Uuid,
}

request!(StartLiveStream => LiveStreamDto, Command);

impl Validate for StartLiveStream {}

#[derive(Debug, Clone)]
pub struct EndLiveStream {
    pub stream_id: Uuid,
}

request!(EndLiveStream => LiveStreamDto, Command);

impl Validate for EndLiveStream {}

#[derive(Debug, Clone)]
pub struct CancelLiveStream {
    pub stream_id: Uuid,
}

request!(CancelLiveStream => LiveStreamDto, Command);

impl Validate for CancelLiveStream {}

#[derive(Debug, Clone)]
pub struct RecordViewerCount {
    pub stream_id: Uuid,
    pub viewers: u32,
}

request!(RecordViewerCount => LiveStreamDto, Command);

impl Validate for RecordViewerCount {}
