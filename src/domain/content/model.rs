use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::common::guard;
use crate::persistence::{Entity, EntityBase, UniqueKey};
use super::errors::ContentError;
use super::events::PageEvent;

pub const TITLE_MAX: usize = 200;
pub const SLUG_MAX: usize = 150;
pub const BODY_MAX: usize = 100_000;
pub const SEO_DESCRIPTION_MAX: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    #[serde(flatten)]
    pub base: EntityBase,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub status: PageStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub seo_description: Option<String>,
    #[serde(skip)]
    events: Vec<PageEvent>,
}

fn seo(value: Option<&str>) -> Result<Option<String>, ContentError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => {
            guard::max_len(v, SEO_DESCRIPTION_MAX, "seo_description")?;
            Ok(Some(v.to_string()))
        }
        None => Ok(None),
    }
}

impl Page {
    pub fn create(
        title: &str,
        slug: &str,
        body: &str,
        seo_description: Option<&str>,
    ) -> Result<Self, ContentError> {
        let title = guard::text(title, TITLE_MAX, "title")?;
        let slug = guard::slug(slug, SLUG_MAX, "slug")?;
        let body = guard::text(body, BODY_MAX, "body")?;
        let seo_description = seo(seo_description)?;

        let base = EntityBase::new();
        let events = vec![PageEvent::PageCreated {
            page_id: base.id,
            slug: slug.clone(),
        }];

        Ok(Self {
            base,
            title,
            slug,
            body,
            status: PageStatus::Draft,
            published_at: None,
            seo_description,
            events,
        })
    }

    pub fn update(
        &mut self,
        title: &str,
        body: &str,
        seo_description: Option<&str>,
    ) -> Result<(), ContentError> {
        if self.status == PageStatus::Archived {
            return Err(transition("update", self.status));
        }
        let title = guard::text(title, TITLE_MAX, "title")?;
        let body = guard::text(body, BODY_MAX, "body")?;
        let seo_description = seo(seo_description)?;
        if title == self.title && body == self.body && seo_description == self.seo_description {
            return Ok(());
        }

        self.title = title;
        self.body = body;
        self.seo_description = seo_description;
        self.base.touch();
        self.events.push(PageEvent::PageUpdated { page_id: self.base.id });
        Ok(())
    }

    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), ContentError> {
        match self.status {
            PageStatus::Draft => {}
            PageStatus::Published => return Ok(()),
            status => return Err(transition("publish", status)),
        }
        self.status = PageStatus::Published;
        self.published_at = Some(now);
        self.base.touch();
        self.events.push(PageEvent::PagePublished {
            page_id: self.base.id,
            slug: self.slug.clone(),
        });
        Ok(())
    }

    pub fn unpublish(&mut self) -> Result<(), ContentError> {
        match self.status {
            PageStatus::Published => {}
            PageStatus::Draft => return Ok(()),
            status => return Err(transition("unpublish", status)),
        }
        self.status = PageStatus::Draft;
        self.published_at = None;
        self.base.touch();
        self.events.push(PageEvent::PageUnpublished { page_id: self.base.id });
        Ok(())
    }

    pub fn archive(&mut self) {
        if self.status == PageStatus::Archived {
            return;
        }
        self.status = PageStatus::Archived;
        self.base.touch();
        self.events.push(PageEvent::PageArchived { page_id: self.base.id });
    }

    pub fn mark_as_deleted(&mut self) -> bool {
        if !self.base.mark_deleted() {
            return false;
        }
        self.events.push(PageEvent::PageDeleted { page_id: self.base.id });
        true
    }
}

fn transition(action: &'static str, status: PageStatus) -> ContentError {
    ContentError::InvalidStatusTransition { action, status }
}

impl Entity for Page {
    type Event = PageEvent;
    const KIND: &'static str = "page";
    const TOPIC: &'static str = "content-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<PageEvent> {
        std::mem::take(&mut self.events)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("slug", self.slug.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::create("Returns", "returns", "30 days", Some("  ")).unwrap()
    }

    #[test]
    fn test_blank_seo_description_is_none() {
        assert!(page().seo_description.is_none());
    }

    #[test]
    fn test_publish_unpublish_cycle() {
        let mut page = page();
        page.take_events();
        page.publish(Utc::now()).unwrap();
        page.publish(Utc::now()).unwrap();
        assert!(page.published_at.is_some());

        page.unpublish().unwrap();
        page.unpublish().unwrap();
        assert_eq!(page.status, PageStatus::Draft);
        assert!(page.published_at.is_none());
        assert_eq!(page.take_events().len(), 2);
    }

    #[test]
    fn test_archived_page_is_frozen() {
        let mut page = page();
        page.archive();
        page.archive();
        assert!(page.publish(Utc::now()).is_err());
        assert!(page.update("New", "Body", None).is_err());
    }

    #[test]
    fn test_unchanged_update_records_nothing() {
        let mut page = page();
        page.take_events();
        page.update("Returns", "30 days", None).unwrap();
        assert!(page.take_events().is_empty());
    }
}
