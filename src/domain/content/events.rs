use serde::Serialize;
use uuid::Uuid;

use crate::persistence::DomainEvent;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PageEvent {
    PageCreated { page_id: Uuid, slug: String },
    PageUpdated { page_id: Uuid },
    PagePublished { page_id: Uuid, slug: String },
    PageUnpublished { page_id: Uuid },
    PageArchived { page_id: Uuid },
    PageDeleted { page_id: Uuid },
}

impl DomainEvent for PageEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::PageCreated { .. } => "PageCreated",
            Self::PageUpdated { .. } => "PageUpdated",
            Self::PagePublished { .. } => "PagePublished",
            Self::PageUnpublished { .. } => "PageUnpublished",
            Self::PageArchived { .. } => "PageArchived",
            Self::PageDeleted { .. } => "PageDeleted",
        }
    }
}
