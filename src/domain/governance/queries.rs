use uuid::Uuid;

use crate::domain::common::{PageRequest, PagedResult};
use crate::mediator::Validate;
use crate::request;
use super::dto::{AuditLogDto, PolicyDto};

#[derive(Debug, Clone)]
pub struct GetActivePolicy {
    pub policy_type: String,
}

request!(GetActivePolicy => Option<PolicyDto>, Query);

impl Validate for GetActivePolicy {}

/// Active policies that require acceptance and the user has not accepted.
#[derive(Debug, Clone)]
pub struct GetPendingPolicies {
    pub user_id: Uuid,
}

request!(GetPendingPolicies => Vec<PolicyDto>, Query);

impl Validate for GetPendingPolicies {}

#[derive(Debug, Clone, Default)]
pub struct ListAuditLogs {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub page: Option<PageRequest>,
}

request!(ListAuditLogs => PagedResult<AuditLogDto>, Query);

impl Validate for ListAuditLogs {}
