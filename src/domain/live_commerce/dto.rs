use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{LiveStream, LiveStreamStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStreamDto {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: LiveStreamStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub featured_products: Vec<Uuid>,
    pub pinned_product_id: Option<Uuid>,
    pub current_viewers: u32,
    pub peak_viewers: u32,
}

impl From<&LiveStream> for LiveStreamDto {
    fn from(s: &LiveStream) -> Self {
        Self {
            id: s.base.id,
            seller_id: s.seller_id,
            title: s.title.clone(),
            scheduled_at: s.scheduled_at,
            status: s.status,
            started_at: s.started_at,
            ended_at: s.ended_at,
            featured_products: s.featured_products.clone(),
            pinned_product_id: s.pinned_product_id,
            current_viewers: s.current_viewers,
            peak_viewers: s.peak_viewers,
        }
    }
}
