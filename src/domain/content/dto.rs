use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{Page, PageStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDto {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub status: PageStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub seo_description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Page> for PageDto {
    fn from(p: &Page) -> Self {
        Self {
            id: p.base.id,
            title: p.title.clone(),
            slug: p.slug.clone(),
            body: p.body.clone(),
            status: p.status,
            published_at: p.published_at,
            seo_description: p.seo_description.clone(),
            updated_at: p.base.updated_at,
        }
    }
}
