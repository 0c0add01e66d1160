use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::persistence::DomainEvent;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum LiveStreamEvent {
    LiveStreamScheduled {
        stream_id: Uuid,
        seller_id: Uuid,
        title: String,
        scheduled_at: DateTime<Utc>,
    },
    ProductFeatured {
        stream_id: Uuid,
        product_id: Uuid,
    },
    ProductPinned {
        stream_id: Uuid,
        product_id: Uuid,
    },
    LiveStreamStarted {
        stream_id: Uuid,
        started_at: DateTime<Utc>,
    },
    LiveStreamEnded {
        stream_id: Uuid,
        ended_at: DateTime<Utc>,
        peak_viewers: u32,
    },
    LiveStreamCancelled {
        stream_id: Uuid,
    },
    PeakViewersReached {
        stream_id: Uuid,
        peak_viewers: u32,
    },
}

impl DomainEvent for LiveStreamEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::LiveStreamScheduled { .. } => "LiveStreamScheduled",
            Self::ProductFeatured { .. } => "ProductFeatured",
            Self::ProductPinned { .. } => "ProductPinned",
            Self::LiveStreamStarted { .. } => "LiveStreamStarted",
            Self::LiveStreamEnded { .. } => "LiveStreamEnded",
            Self::LiveStreamCancelled { .. } => "LiveStreamCancelled",
            Self::PeakViewersReached { .. } => "PeakViewersReached",
        }
    }
}
