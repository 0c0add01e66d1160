use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::guard;
use crate::persistence::{Entity, EntityBase};
use super::errors::LiveCommerceError;
use super::events::LiveStreamEvent;

pub const TITLE_MAX: usize = 200;
pub const FEATURED_MAX: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiveStreamStatus {
    Scheduled,
    Live,
    Ended,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveStream {
    #[serde(flatten)]
    pub base: EntityBase,
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
    #[serde(skip)]
    events: Vec<LiveStreamEvent>,
}

impl LiveStream {
    pub fn schedule(
        seller_id: Uuid,
        title: &str,
        scheduled_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, LiveCommerceError> {
        let seller_id = guard::not_nil(seller_id, "seller_id")?;
        let title = guard::text(title, TITLE_MAX, "title")?;
        if scheduled_at <= now {
            return Err(LiveCommerceError::ScheduledInPast);
        }

        let base = EntityBase::new();
        let events = vec![LiveStreamEvent::LiveStreamScheduled {
            stream_id: base.id,
            seller_id,
            title: title.clone(),
            scheduled_at,
        }];

        Ok(Self {
            base,
            seller_id,
            title,
            scheduled_at,
            status: LiveStreamStatus::Scheduled,
            started_at: None,
            ended_at: None,
            featured_products: Vec::new(),
            pinned_product_id: None,
            current_viewers: 0,
            peak_viewers: 0,
            events,
        })
    }

    pub fn is_featured(&self, product_id: Uuid) -> bool {
        self.featured_products.contains(&product_id)
    }

    pub fn add_featured_product(&mut self, product_id: Uuid) -> Result<(), LiveCommerceError> {
        let product_id = guard::not_nil(product_id, "product_id")?;
        match self.status {
            LiveStreamStatus::Scheduled | LiveStreamStatus::Live => {}
            status => return Err(transition("feature products on", status)),
        }
        if self.is_featured(product_id) {
            return Ok(());
        }
        if self.featured_products.len() >= FEATURED_MAX {
            return Err(LiveCommerceError::TooManyFeatured(FEATURED_MAX));
        }

        self.featured_products.push(product_id);
        self.base.touch();
        self.events.push(LiveStreamEvent::ProductFeatured {
            stream_id: self.base.id,
            product_id,
        });
        Ok(())
    }

    pub fn pin_product(&mut self, product_id: Uuid) -> Result<(), LiveCommerceError> {
        if self.status != LiveStreamStatus::Live {
            return Err(transition("pin a product on", self.status));
        }
        if !self.is_featured(product_id) {
            return Err(LiveCommerceError::ProductNotFeatured(product_id));
        }
        if self.pinned_product_id == Some(product_id) {
            return Ok(());
        }

        self.pinned_product_id = Some(product_id);
        self.base.touch();
        self.events.push(LiveStreamEvent::ProductPinned {
            stream_id: self.base.id,
            product_id,
        });
        Ok(())
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), LiveCommerceError> {
        match self.status {
            LiveStreamStatus::Scheduled => {}
            LiveStreamStatus::Live => return Ok(()),
            status => return Err(transition("start", status)),
        }

        self.status = LiveStreamStatus::Live;
        self.started_at = Some(now);
        self.base.touch();
        self.events.push(LiveStreamEvent::LiveStreamStarted {
            stream_id: self.base.id,
            started_at: now,
        });
        Ok(())
    }

    pub fn end(&mut self, now: DateTime<Utc>) -> Result<(), LiveCommerceError> {
        match self.status {
            LiveStreamStatus::Live => {}
            LiveStreamStatus::Ended => return Ok(()),
            status => return Err(transition("end", status)),
        }

        self.status = LiveStreamStatus::Ended;
        self.ended_at = Some(now);
        self.pinned_product_id = None;
        self.current_viewers = 0;
        self.base.touch();
        self.events.push(LiveStreamEvent::LiveStreamEnded {
            stream_id: self.base.id,
            ended_at: now,
            peak_viewers: self.peak_viewers,
        });
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), LiveCommerceError> {
        match self.status {
            LiveStreamStatus::Scheduled => {}
            LiveStreamStatus::Cancelled => return Ok(()),
            status => return Err(transition("cancel", status)),
        }

        self.status = LiveStreamStatus::Cancelled;
        self.base.touch();
        self.events.push(LiveStreamEvent::LiveStreamCancelled {
            stream_id: self.base.id,
        });
        Ok(())
    }

    /// The peak never decreases; an event is recorded only on a new peak.
    pub fn record_viewer_count(&mut self, viewers: u32) -> Result<(), LiveCommerceError> {
        if self.status != LiveStreamStatus::Live {
            return Err(transition("record viewers on", self.status));
        }

        self.current_viewers = viewers;
        self.base.touch();
        if viewers > self.peak_viewers {
            self.peak_viewers = viewers;
            self.events.push(LiveStreamEvent::PeakViewersReached {
                stream_id: self.base.id,
                peak_viewers: viewers,
            });
        }
        Ok(())
    }
}

fn transition(action: &'static str, status: LiveStreamStatus) -> LiveCommerceError {
    LiveCommerceError::InvalidStatusTransition { action, status }
}

impl Entity for LiveStream {
    type Event = LiveStreamEvent;
    const KIND: &'static str = "live_stream";
    const TOPIC: &'static str = "live-commerce-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<LiveStreamEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn stream() -> LiveStream {
        let now = Utc::now();
        LiveStream::schedule(Uuid::new_v4(), "Spring drop", now + Duration::hours(2), now).unwrap()
    }

    #[test]
    fn test_schedule_requires_future_start() {
        let now = Utc::now();
        assert!(matches!(
            LiveStream::schedule(Uuid::new_v4(), "Late", now, now),
            Err(LiveCommerceError::ScheduledInPast)
        ));
    }

    #[test]
    fn test_pin_requires_live_and_featured() {
        let mut stream = stream();
        let product = Uuid::new_v4();
        stream.add_featured_product(product).unwrap();
        stream.add_featured_product(product).unwrap();
        assert_eq!(stream.featured_products.len(), 1);

        assert!(matches!(
            stream.pin_product(product),
            Err(LiveCommerceError::InvalidStatusTransition { .. })
        ));

        stream.start(Utc::now()).unwrap();
        assert!(matches!(
            stream.pin_product(Uuid::new_v4()),
            Err(LiveCommerceError::ProductNotFeatured(_))
        ));
        stream.pin_product(product).unwrap();
        assert_eq!(stream.pinned_product_id, Some(product));

        stream.end(Utc::now()).unwrap();
        assert!(stream.pinned_product_id.is_none());
    }

    #[test]
    fn test_peak_viewers_is_monotonic() {
        let mut stream = stream();
        assert!(stream.record_viewer_count(5).is_err());

        stream.start(Utc::now()).unwrap();
        stream.take_events();
        stream.record_viewer_count(120).unwrap();
        stream.record_viewer_count(80).unwrap();
        stream.record_viewer_count(120).unwrap();

        assert_eq!(stream.current_viewers, 120);
        assert_eq!(stream.peak_viewers, 120);
        assert_eq!(stream.take_events().len(), 1);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut stream = stream();
        assert!(stream.end(Utc::now()).is_err());
        stream.cancel().unwrap();
        stream.cancel().unwrap();
        assert!(stream.start(Utc::now()).is_err());
        assert!(stream.add_featured_product(Uuid::new_v4()).is_err());
    }
}
