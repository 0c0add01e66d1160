use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::model::{AuditLog, Policy, PolicyAcceptance};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDto {
    pub id: Uuid,
    pub policy_type: String,
    pub version: u32,
    pub title: String,
    pub content: String,
    pub effective_from: DateTime<Utc>,
    pub is_active: bool,
    pub requires_acceptance: bool,
}

impl From<&Policy> for PolicyDto {
    fn from(p: &Policy) -> Self {
        Self {
            id: p.base.id,
            policy_type: p.policy_type.clone(),
            version: p.version,
            title: p.title.clone(),
            content: p.content.clone(),
            effective_from: p.effective_from,
            is_active: p.is_active,
            requires_acceptance: p.requires_acceptance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAcceptanceDto {
    pub id: Uuid,
    pub policy_id: Uuid,
    pub policy_type: String,
    pub policy_version: u32,
    pub user_id: Uuid,
    pub accepted_at: DateTime<Utc>,
    pub ip_address: Option<String>,
}

impl From<&PolicyAcceptance> for PolicyAcceptanceDto {
    fn from(a: &PolicyAcceptance) -> Self {
        Self {
            id: a.base.id,
            policy_id: a.policy_id,
            policy_type: a.policy_type.clone(),
            policy_version: a.policy_version,
            user_id: a.user_id,
            accepted_at: a.accepted_at,
            ip_address: a.ip_address.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogDto {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: Option<Value>,
    pub occurred_at: DateTime<Utc>,
}

impl From<&AuditLog> for AuditLogDto {
    fn from(a: &AuditLog) -> Self {
        Self {
            id: a.base.id,
            actor_id: a.actor_id,
            action: a.action.clone(),
            entity_type: a.entity_type.clone(),
            entity_id: a.entity_id,
            details: a.details.clone(),
            occurred_at: a.occurred_at,
        }
    }
}
