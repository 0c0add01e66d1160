use serde::Serialize;
use uuid::Uuid;

use crate::persistence::DomainEvent;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PolicyEvent {
    PolicyPublished {
        policy_id: Uuid,
        policy_type: String,
        version: u32,
        requires_acceptance: bool,
    },
    PolicySuperseded {
        policy_id: Uuid,
        policy_type: String,
        version: u32,
    },
}

impl DomainEvent for PolicyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::PolicyPublished { .. } => "PolicyPublished",
            Self::PolicySuperseded { .. } => "PolicySuperseded",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AcceptanceEvent {
    PolicyAccepted {
        acceptance_id: Uuid,
        policy_id: Uuid,
        user_id: Uuid,
        policy_version: u32,
    },
}

impl DomainEvent for AcceptanceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::PolicyAccepted { .. } => "PolicyAccepted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AuditEvent {
    AuditRecorded {
        audit_id: Uuid,
        action: String,
        entity_type: String,
        entity_id: Uuid,
    },
}

impl DomainEvent for AuditEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::AuditRecorded { .. } => "AuditRecorded",
        }
    }
}
