use uuid::Uuid;

use crate::domain::common::guard;
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::PageDto;
use super::model::{BODY_MAX, SEO_DESCRIPTION_MAX, SLUG_MAX, TITLE_MAX};

// ============================================================================
// Content Commands
// ============================================================================

#[derive(Debug, Clone)]
pub struct CreatePage {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub seo_description: Option<String>,
}

request!(CreatePage => PageDto, Command);

impl Validate for CreatePage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.guard(guard::text(&self.title, TITLE_MAX, "title"))
            .guard(guard::slug(&self.slug, SLUG_MAX, "slug"))
            .guard(guard::text(&self.body, BODY_MAX, "body"));
        if let Some(seo) = &self.seo_description {
            v.guard(guard::max_len(seo.trim(), SEO_DESCRIPTION_MAX, "seo_description"));
        }
        v.finish()
    }
}

#[derive(Debug, Clone)]
pub struct UpdatePage {
    pub page_id: Uuid,
    pub title: String,
    pub body: String,
    pub seo_description: Option<String>,
}

request!(UpdatePage => PageDto, Command);

impl Validate for UpdatePage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.guard(guard::not_nil(self.page_id, "page_id"))
            .guard(guard::text(&self.title, TITLE_MAX, "title"))
            .guard(guard::text(&self.body, BODY_MAX, "body"));
        if let Some(seo) = &self.seo_description {
            v.guard(guard::max_len(seo.trim(), SEO_DESCRIPTION_MAX, "seo_description"));
        }
        v.finish()
    }
}

#[derive(Debug, Clone)]
pub struct PublishPage {
    pub page_id: Uuid,
}

request!(PublishPage => PageDto, Command);

impl Validate for PublishPage {}

#[derive(Debug, Clone)]
pub struct UnpublishPage {
    pub page_id: Uuid,
}

request!(UnpublishPage => PageDto, Command);

impl Validate for UnpublishPage {}

#[derive(Debug, Clone)]
pub struct ArchivePage {
    pub page_id: Uuid,
}

request!(ArchivePage => PageDto, Command);

impl Validate for ArchivePage {}

#[derive(Debug, Clone)]
pub struct DeletePage {
    pub page_id: Uuid,
}

request!(DeletePage => bool, Command);

impl Validate for DeletePage {}
