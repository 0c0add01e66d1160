use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::AppContext;
use crate::domain::common::PagedResult;
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::Criteria;
use super::commands::*;
use super::dto::{AuditLogDto, PolicyAcceptanceDto, PolicyDto};
use super::model::{AuditLog, NewAuditLog, NewPolicy, Policy, PolicyAcceptance};
use super::queries::*;

pub struct GovernanceHandlers {
    ctx: AppContext,
}

impl GovernanceHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(GovernanceHandlers::new(ctx.clone()));
    builder.register::<PublishPolicy>(handlers.clone());
    builder.register::<AcceptPolicy>(handlers.clone());
    builder.register::<RecordAudit>(handlers.clone());
    builder.register::<GetActivePolicy>(handlers.clone());
    builder.register::<GetPendingPolicies>(handlers.clone());
    builder.register::<ListAuditLogs>(handlers);
}

// ============================================================================
// Commands
// ============================================================================

#[async_trait]
impl RequestHandler<PublishPolicy> for GovernanceHandlers {
    async fn handle(&self, request: &PublishPolicy, meta: &RequestMeta) -> Result<PolicyDto, AppError> {
        let policies = self.ctx.data.set::<Policy>();
        let policy_type = request.policy_type.trim();

        let latest = policies
            .first(
                Criteria::new()
                    .eq("policy_type", policy_type)
                    .include_deleted()
                    .order_by("version", true),
            )
            .await?;
        let version = latest.map_or(1, |p| p.version + 1);

        let mut policy = Policy::publish(NewPolicy {
            policy_type,
            version,
            title: &request.title,
            content: &request.content,
            effective_from: request.effective_from.unwrap_or_else(Utc::now),
            requires_acceptance: request.requires_acceptance,
        })?;

        let mut previous = policies
            .all(
                Criteria::new()
                    .eq("policy_type", &policy.policy_type)
                    .eq("is_active", true),
            )
            .await?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        for old in previous.iter_mut() {
            old.supersede();
            uow.update(old)?;
        }
        uow.add(&mut policy)?;
        uow.save_changes().await?;

        tracing::info!(
            policy_id = %policy.base.id,
            policy_type = %policy.policy_type,
            version = policy.version,
            superseded = previous.len(),
            "Policy published"
        );
        Ok(PolicyDto::from(&policy))
    }
}

#[async_trait]
impl RequestHandler<AcceptPolicy> for GovernanceHandlers {
    async fn handle(&self, request: &AcceptPolicy, meta: &RequestMeta) -> Result<PolicyAcceptanceDto, AppError> {
        let policy = self.ctx.data.set::<Policy>().get(request.policy_id, "Policy").await?;

        let existing = self
            .ctx
            .data
            .set::<PolicyAcceptance>()
            .first(
                Criteria::new()
                    .eq("policy_id", request.policy_id)
                    .eq("user_id", request.user_id),
            )
            .await?;
        if let Some(acceptance) = existing {
            return Ok(PolicyAcceptanceDto::from(&acceptance));
        }

        let mut acceptance = PolicyAcceptance::accept(
            &policy,
            request.user_id,
            request.ip_address.as_deref(),
            Utc::now(),
        )?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut acceptance)?;
        uow.save_changes().await?;

        tracing::info!(
            policy_id = %policy.base.id,
            user_id = %acceptance.user_id,
            version = acceptance.policy_version,
            "Policy accepted"
        );
        Ok(PolicyAcceptanceDto::from(&acceptance))
    }
}

#[async_trait]
impl RequestHandler<RecordAudit> for GovernanceHandlers {
    async fn handle(&self, request: &RecordAudit, meta: &RequestMeta) -> Result<AuditLogDto, AppError> {
        let mut entry = AuditLog::record(
            NewAuditLog {
                actor_id: request.actor_id.or(meta.user_id),
                action: &request.action,
                entity_type: &request.entity_type,
                entity_id: request.entity_id,
                details: request.details.clone(),
            },
            Utc::now(),
        )?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut entry)?;
        uow.save_changes().await?;
        Ok(AuditLogDto::from(&entry))
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetActivePolicy> for GovernanceHandlers {
    async fn handle(&self, request: &GetActivePolicy, _meta: &RequestMeta) -> Result<Option<PolicyDto>, AppError> {
        let policy = self
            .ctx
            .data
            .set::<Policy>()
            .first(
                Criteria::new()
                    .eq("policy_type", request.policy_type.trim())
                    .eq("is_active", true),
            )
            .await?;
        Ok(policy.as_ref().map(PolicyDto::from))
    }
}

#[async_trait]
impl RequestHandler<GetPendingPolicies> for GovernanceHandlers {
    async fn handle(&self, request: &GetPendingPolicies, _meta: &RequestMeta) -> Result<Vec<PolicyDto>, AppError> {
        let required = self
            .ctx
            .data
            .set::<Policy>()
            .all(
                Criteria::new()
                    .eq("is_active", true)
                    .eq("requires_acceptance", true)
                    .order_by("policy_type", false),
            )
            .await?;
        if required.is_empty() {
            return Ok(Vec::new());
        }

        let accepted: HashSet<_> = self
            .ctx
            .data
            .set::<PolicyAcceptance>()
            .all(Criteria::new().eq("user_id", request.user_id))
            .await?
            .into_iter()
            .map(|a| a.policy_id)
            .collect();

        Ok(required
            .iter()
            .filter(|p| !accepted.contains(&p.base.id))
            .map(PolicyDto::from)
            .collect())
    }
}

#[async_trait]
impl RequestHandler<ListAuditLogs> for GovernanceHandlers {
    async fn handle(&self, request: &ListAuditLogs, _meta: &RequestMeta) -> Result<PagedResult<AuditLogDto>, AppError> {
        let page = self.ctx.settings.page(request.page);
        let criteria = Criteria::new()
            .eq_opt("entity_type", request.entity_type.as_deref())
            .eq_opt("entity_id", request.entity_id)
            .eq_opt("actor_id", request.actor_id)
            .newest_first();

        let logs = self.ctx.data.set::<AuditLog>().paged(criteria, page).await?;
        Ok(logs.map(|l| AuditLogDto::from(&l)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{app, TestApp};
    use serde_json::json;
    use uuid::Uuid;

    async fn publish(app: &TestApp, policy_type: &str, requires_acceptance: bool) -> PolicyDto {
        app.mediator
            .send(PublishPolicy {
                policy_type: policy_type.to_string(),
                title: "Policy".to_string(),
                content: "Text".to_string(),
                effective_from: None,
                requires_acceptance,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_publish_increments_version_and_supersedes() {
        let app = app();
        let v1 = publish(&app, "terms", true).await;
        let v2 = publish(&app, "terms", true).await;
        publish(&app, "privacy", false).await;

        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);

        let active = app
            .mediator
            .send(GetActivePolicy {
                policy_type: "terms".to_string(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.id, v2.id);

        assert_eq!(
            app.outbox_event_types().await,
            vec!["PolicyPublished", "PolicySuperseded", "PolicyPublished", "PolicyPublished"]
        );
    }

    #[tokio::test]
    async fn test_accept_twice_returns_existing() {
        let app = app();
        let policy = publish(&app, "terms", true).await;
        let user = Uuid::new_v4();
        let accept = AcceptPolicy {
            policy_id: policy.id,
            user_id: user,
            ip_address: Some("127.0.0.1".to_string()),
        };

        let first = app.mediator.send(accept.clone()).await.unwrap();
        let second = app.mediator.send(accept).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(app.store.entity_count("policy_acceptance").await, 1);
    }

    #[tokio::test]
    async fn test_superseded_policy_rejects_acceptance() {
        let app = app();
        let old = publish(&app, "terms", true).await;
        publish(&app, "terms", true).await;

        let err = app
            .mediator
            .send(AcceptPolicy {
                policy_id: old.id,
                user_id: Uuid::new_v4(),
                ip_address: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_pending_policies_for_user() {
        let app = app();
        let terms = publish(&app, "terms", true).await;
        let privacy = publish(&app, "privacy", true).await;
        publish(&app, "cookies", false).await;
        let user = Uuid::new_v4();

        app.mediator
            .send(AcceptPolicy {
                policy_id: terms.id,
                user_id: user,
                ip_address: None,
            })
            .await
            .unwrap();

        let pending = app.mediator.send(GetPendingPolicies { user_id: user }).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, privacy.id);

        // A new version must be accepted again.
        publish(&app, "terms", true).await;
        let pending = app.mediator.send(GetPendingPolicies { user_id: user }).await.unwrap();
        assert_eq!(pending.len(), 2);
    }

    #[tokio::test]
    async fn test_audit_log_filters_and_actor_from_meta() {
        let app = app();
        let order_id = Uuid::new_v4();
        let admin = Uuid::new_v4();

        let meta = RequestMeta::for_request::<RecordAudit>().with_user(admin);
        let logged = app
            .mediator
            .send_with_meta(
                RecordAudit {
                    actor_id: None,
                    action: "order.refunded".to_string(),
                    entity_type: "order".to_string(),
                    entity_id: order_id,
                    details: Some(json!({ "amount": 1500 })),
                },
                meta,
            )
            .await
            .unwrap();
        assert_eq!(logged.actor_id, Some(admin));

        app.mediator
            .send(RecordAudit {
                actor_id: None,
                action: "product.updated".to_string(),
                entity_type: "product".to_string(),
                entity_id: Uuid::new_v4(),
                details: None,
            })
            .await
            .unwrap();

        let logs = app
            .mediator
            .send(ListAuditLogs {
                entity_type: Some("order".to_string()),
                entity_id: Some(order_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(logs.total_count, 1);
        assert_eq!(logs.items[0].details, Some(json!({ "amount": 1500 })));
    }
}
