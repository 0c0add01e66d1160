use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::common::guard;
use crate::persistence::{Entity, EntityBase};
use super::errors::GovernanceError;
use super::events::{AcceptanceEvent, AuditEvent, PolicyEvent};

pub const POLICY_TYPE_MAX: usize = 64;
pub const TITLE_MAX: usize = 200;
pub const CONTENT_MAX: usize = 200_000;
pub const ACTION_MAX: usize = 100;
pub const ENTITY_TYPE_MAX: usize = 64;
pub const IP_MAX: usize = 45;

// ============================================================================
// Policy
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    #[serde(flatten)]
    pub base: EntityBase,
    /// Lowercase key such as `terms-of-service`.
    pub policy_type: String,
    pub version: u32,
    pub title: String,
    pub content: String,
    pub effective_from: DateTime<Utc>,
    pub is_active: bool,
    pub requires_acceptance: bool,
    #[serde(skip)]
    events: Vec<PolicyEvent>,
}

pub struct NewPolicy<'a> {
    pub policy_type: &'a str,
    pub version: u32,
    pub title: &'a str,
    pub content: &'a str,
    pub effective_from: DateTime<Utc>,
    pub requires_acceptance: bool,
}

impl Policy {
    /// New versions are published active.
    pub fn publish(new: NewPolicy<'_>) -> Result<Self, GovernanceError> {
        let policy_type = guard::slug(new.policy_type, POLICY_TYPE_MAX, "policy_type")?;
        let version = guard::positive(new.version, "version")?;
        let title = guard::text(new.title, TITLE_MAX, "title")?;
        let content = guard::text(new.content, CONTENT_MAX, "content")?;

        let base = EntityBase::new();
        let events = vec![PolicyEvent::PolicyPublished {
            policy_id: base.id,
            policy_type: policy_type.clone(),
            version,
            requires_acceptance: new.requires_acceptance,
        }];

        Ok(Self {
            base,
            policy_type,
            version,
            title,
            content,
            effective_from: new.effective_from,
            is_active: true,
            requires_acceptance: new.requires_acceptance,
            events,
        })
    }

    pub fn supersede(&mut self) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.base.touch();
        self.events.push(PolicyEvent::PolicySuperseded {
            policy_id: self.base.id,
            policy_type: self.policy_type.clone(),
            version: self.version,
        });
    }
}

impl Entity for Policy {
    type Event = PolicyEvent;
    const KIND: &'static str = "policy";
    const TOPIC: &'static str = "governance-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<PolicyEvent> {
        std::mem::take(&mut self.events)
    }
}

// ============================================================================
// PolicyAcceptance
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyAcceptance {
    #[serde(flatten)]
    pub base: EntityBase,
    pub policy_id: Uuid,
    pub policy_type: String,
    pub policy_version: u32,
    pub user_id: Uuid,
    pub accepted_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    #[serde(skip)]
    events: Vec<AcceptanceEvent>,
}

impl PolicyAcceptance {
    pub fn accept(
        policy: &Policy,
        user_id: Uuid,
        ip_address: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, GovernanceError> {
        let user_id = guard::not_nil(user_id, "user_id")?;
        if !policy.is_active {
            return Err(GovernanceError::PolicyNotActive(policy.base.id));
        }
        let ip_address = match ip_address.map(str::trim).filter(|ip| !ip.is_empty()) {
            Some(ip) => {
                guard::max_len(ip, IP_MAX, "ip_address")?;
                Some(ip.to_string())
            }
            None => None,
        };

        let base = EntityBase::new();
        let events = vec![AcceptanceEvent::PolicyAccepted {
            acceptance_id: base.id,
            policy_id: policy.base.id,
            user_id,
            policy_version: policy.version,
        }];

        Ok(Self {
            base,
            policy_id: policy.base.id,
            policy_type: policy.policy_type.clone(),
            policy_version: policy.version,
            user_id,
            accepted_at: now,
            ip_address,
            events,
        })
    }
}

impl Entity for PolicyAcceptance {
    type Event = AcceptanceEvent;
    const KIND: &'static str = "policy_acceptance";
    const TOPIC: &'static str = "governance-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<AcceptanceEvent> {
        std::mem::take(&mut self.events)
    }
}

// ============================================================================
// AuditLog
// ============================================================================

/// Append-only record of an action taken on an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(flatten)]
    pub base: EntityBase,
    /// `None` for system actions.
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: Option<Value>,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<AuditEvent>,
}

pub struct NewAuditLog<'a> {
    pub actor_id: Option<Uuid>,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Uuid,
    pub details: Option<Value>,
}

impl AuditLog {
    pub fn record(new: NewAuditLog<'_>, now: DateTime<Utc>) -> Result<Self, GovernanceError> {
        let action = guard::text(new.action, ACTION_MAX, "action")?;
        let entity_type = guard::text(new.entity_type, ENTITY_TYPE_MAX, "entity_type")?;
        let entity_id = guard::not_nil(new.entity_id, "entity_id")?;

        let base = EntityBase::new();
        let events = vec![AuditEvent::AuditRecorded {
            audit_id: base.id,
            action: action.clone(),
            entity_type: entity_type.clone(),
            entity_id,
        }];

        Ok(Self {
            base,
            actor_id: new.actor_id,
            action,
            entity_type,
            entity_id,
            details: new.details,
            occurred_at: now,
            events,
        })
    }
}

impl Entity for AuditLog {
    type Event = AuditEvent;
    const KIND: &'static str = "audit_log";
    const TOPIC: &'static str = "governance-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.events)
    }
}
