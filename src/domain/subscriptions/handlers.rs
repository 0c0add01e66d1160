use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::AppContext;
use crate::error::AppError;
use crate::mediator::{MediatorBuilder, RequestHandler, RequestMeta};
use crate::persistence::Criteria;
use super::commands::*;
use super::dto::{PlanDto, SubscriptionDto};
use super::errors::SubscriptionError;
use super::model::{Subscription, SubscriptionPlan, SubscriptionStatus};
use super::queries::*;

pub struct SubscriptionHandlers {
    ctx: AppContext,
}

impl SubscriptionHandlers {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    async fn load_plan(&self, plan_id: Uuid) -> Result<SubscriptionPlan, AppError> {
        self.ctx.data.set::<SubscriptionPlan>().get(plan_id, "SubscriptionPlan").await
    }

    async fn load(&self, subscription_id: Uuid) -> Result<Subscription, AppError> {
        self.ctx
            .data
            .set::<Subscription>()
            .get(subscription_id, "Subscription")
            .await
    }

    async fn save(&self, mut subscription: Subscription, meta: &RequestMeta) -> Result<SubscriptionDto, AppError> {
        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut subscription)?;
        uow.save_changes().await?;
        Ok(SubscriptionDto::from(&subscription))
    }
}

pub fn register(builder: &mut MediatorBuilder, ctx: &AppContext) {
    let handlers = Arc::new(SubscriptionHandlers::new(ctx.clone()));
    builder.register::<CreatePlan>(handlers.clone());
    builder.register::<RetirePlan>(handlers.clone());
    builder.register::<Subscribe>(handlers.clone());
    builder.register::<CancelSubscription>(handlers.clone());
    builder.register::<RenewSubscription>(handlers.clone());
    builder.register::<MarkSubscriptionPastDue>(handlers.clone());
    builder.register::<GetSubscription>(handlers.clone());
    builder.register::<ListCustomerSubscriptions>(handlers.clone());
    builder.register::<ListPlans>(handlers);
}

// ============================================================================
// Plans
// ============================================================================

#[async_trait]
impl RequestHandler<CreatePlan> for SubscriptionHandlers {
    async fn handle(&self, request: &CreatePlan, meta: &RequestMeta) -> Result<PlanDto, AppError> {
        let mut plan = SubscriptionPlan::create(
            &request.name,
            request.price,
            request.interval,
            request.trial_days,
        )?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut plan)?;
        uow.save_changes().await?;

        tracing::info!(plan_id = %plan.base.id, name = %plan.name, "Subscription plan created");
        Ok(PlanDto::from(&plan))
    }
}

#[async_trait]
impl RequestHandler<RetirePlan> for SubscriptionHandlers {
    async fn handle(&self, request: &RetirePlan, meta: &RequestMeta) -> Result<PlanDto, AppError> {
        let mut plan = self.load_plan(request.plan_id).await?;
        plan.retire();

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.update(&mut plan)?;
        uow.save_changes().await?;
        Ok(PlanDto::from(&plan))
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

#[async_trait]
impl RequestHandler<Subscribe> for SubscriptionHandlers {
    async fn handle(&self, request: &Subscribe, meta: &RequestMeta) -> Result<SubscriptionDto, AppError> {
        let plan = self.load_plan(request.plan_id).await?;

        let existing = self
            .ctx
            .data
            .set::<Subscription>()
            .all(
                Criteria::new()
                    .eq("customer_id", request.customer_id)
                    .eq("plan_id", request.plan_id),
            )
            .await?;
        if existing.iter().any(|s| s.status.is_live()) {
            return Err(SubscriptionError::AlreadySubscribed {
                customer_id: request.customer_id,
                plan_id: request.plan_id,
            }
            .into());
        }

        let mut subscription = Subscription::start(request.customer_id, &plan, Utc::now())?;

        let mut uow = self.ctx.data.begin(meta.correlation_id);
        uow.add(&mut subscription)?;
        uow.save_changes().await?;

        tracing::info!(
            subscription_id = %subscription.base.id,
            customer_id = %subscription.customer_id,
            plan_id = %plan.base.id,
            status = ?subscription.status,
            "Subscription started"
        );
        Ok(SubscriptionDto::from(&subscription))
    }
}

#[async_trait]
impl RequestHandler<CancelSubscription> for SubscriptionHandlers {
    async fn handle(&self, request: &CancelSubscription, meta: &RequestMeta) -> Result<SubscriptionDto, AppError> {
        let mut subscription = self.load(request.subscription_id).await?;
        subscription.cancel(request.at_period_end, Utc::now());
        self.save(subscription, meta).await
    }
}

#[async_trait]
impl RequestHandler<RenewSubscription> for SubscriptionHandlers {
    async fn handle(&self, request: &RenewSubscription, meta: &RequestMeta) -> Result<SubscriptionDto, AppError> {
        let mut subscription = self.load(request.subscription_id).await?;
        // Retired plans still renew their existing subscribers.
        let plan = self.load_plan(subscription.plan_id).await?;
        subscription.renew(plan.interval)?;
        tracing::debug!(
            subscription_id = %subscription.base.id,
            period_end = %subscription.current_period_end,
            status = ?subscription.status,
            "Subscription renewed"
        );
        self.save(subscription, meta).await
    }
}

#[async_trait]
impl RequestHandler<MarkSubscriptionPastDue> for SubscriptionHandlers {
    async fn handle(&self, request: &MarkSubscriptionPastDue, meta: &RequestMeta) -> Result<SubscriptionDto, AppError> {
        let mut subscription = self.load(request.subscription_id).await?;
        subscription.mark_past_due()?;
        tracing::warn!(subscription_id = %subscription.base.id, "Subscription past due");
        self.save(subscription, meta).await
    }
}

// ============================================================================
// Queries
// ============================================================================

#[async_trait]
impl RequestHandler<GetSubscription> for SubscriptionHandlers {
    async fn handle(&self, request: &GetSubscription, _meta: &RequestMeta) -> Result<Option<SubscriptionDto>, AppError> {
        let subscription = self.ctx.data.set::<Subscription>().find(request.subscription_id).await?;
        Ok(subscription.as_ref().map(SubscriptionDto::from))
    }
}

#[async_trait]
impl RequestHandler<ListCustomerSubscriptions> for SubscriptionHandlers {
    async fn handle(&self, request: &ListCustomerSubscriptions, _meta: &RequestMeta) -> Result<Vec<SubscriptionDto>, AppError> {
        let subscriptions = self
            .ctx
            .data
            .set::<Subscription>()
            .all(Criteria::new().eq("customer_id", request.customer_id).newest_first())
            .await?;

        Ok(subscriptions
            .iter()
            .filter(|s| request.include_cancelled || s.status != SubscriptionStatus::Cancelled)
            .map(SubscriptionDto::from)
            .collect())
    }
}

#[async_trait]
impl RequestHandler<ListPlans> for SubscriptionHandlers {
    async fn handle(&self, request: &ListPlans, _meta: &RequestMeta) -> Result<Vec<PlanDto>, AppError> {
        let mut criteria = Criteria::new().order_by("price", false);
        if request.active_only {
            criteria = criteria.eq("is_active", true);
        }
        let plans = self.ctx.data.set::<SubscriptionPlan>().all(criteria).await?;
        Ok(plans.iter().map(PlanDto::from).collect())
    }
}
