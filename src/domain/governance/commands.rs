use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::common::guard;
use crate::mediator::{Validate, ValidationErrors, Validator};
use crate::request;
use super::dto::{AuditLogDto, PolicyAcceptanceDto, PolicyDto};
use super::model::{ACTION_MAX, CONTENT_MAX, ENTITY_TYPE_MAX, POLICY_TYPE_MAX, TITLE_MAX};

// ============================================================================
// Governance Commands
// ============================================================================

/// The version is assigned: one above the highest published for the type.
#[derive(Debug, Clone)]
pub struct PublishPolicy {
    pub policy_type: String,
    pub title: String,
    pub content: String,
    /// Defaults to now.
    pub effective_from: Option<DateTime<Utc>>,
    pub requires_acceptance: bool,
}

request!(PublishPolicy => PolicyDto, Command);

impl Validate for PublishPolicy {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::slug(&self.policy_type, POLICY_TYPE_MAX, "policy_type"))
            .guard(guard::text(&self.title, TITLE_MAX, "title"))
            .guard(guard::text(&self.content, CONTENT_MAX, "content"))
            .finish()
    }
}

/// Accepting the same policy twice returns the first acceptance.
#[derive(Debug, Clone)]
pub struct AcceptPolicy {
    pub policy_id: Uuid,
    pub user_id: Uuid,
    pub ip_address: Option<String>,
}

request!(AcceptPolicy => PolicyAcceptanceDto, Command);

impl Validate for AcceptPolicy {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::not_nil(self.policy_id, "policy_id"))
            .guard(guard::not_nil(self.user_id, "user_id"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RecordAudit {
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: Option<Value>,
}

request!(RecordAudit => AuditLogDto, Command);

impl Validate for RecordAudit {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .guard(guard::text(&self.action, ACTION_MAX, "action"))
            .guard(guard::text(&self.entity_type, ENTITY_TYPE_MAX, "entity_type"))
            .guard(guard::not_nil(self.entity_id, "entity_id"))
            .finish()
    }
}
