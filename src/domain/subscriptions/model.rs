use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{guard, Cents};
use crate::persistence::{Entity, EntityBase};
use super::errors::SubscriptionError;
use super::events::{PlanEvent, SubscriptionEvent};

pub const NAME_MAX: usize = 200;
pub const TRIAL_DAYS_MAX: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillingInterval {
    Monthly,
    Yearly,
}

impl BillingInterval {
    /// End of the `n`th billing period counted from `anchor`. Each end is
    /// computed from the anchor, so a Jan 31 anchor gives Feb 28, Mar 31,
    /// Apr 30 rather than drifting to the 28th.
    pub fn period_end(self, anchor: DateTime<Utc>, n: u32) -> DateTime<Utc> {
        let months = match self {
            Self::Monthly => 1u32,
            Self::Yearly => 12,
        }
        .saturating_mul(n);
        anchor
            .checked_add_months(Months::new(months))
            .unwrap_or(anchor + Duration::days(30 * i64::from(months)))
    }
}

// ============================================================================
// SubscriptionPlan
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(flatten)]
    pub base: EntityBase,
    pub name: String,
    pub price: Cents,
    pub interval: BillingInterval,
    pub trial_days: u32,
    pub is_active: bool,
    #[serde(skip)]
    events: Vec<PlanEvent>,
}

impl SubscriptionPlan {
    pub fn create(
        name: &str,
        price: Cents,
        interval: BillingInterval,
        trial_days: u32,
    ) -> Result<Self, SubscriptionError> {
        let name = guard::text(name, NAME_MAX, "name")?;
        let price = guard::non_negative(price, "price")?;
        let trial_days = guard::in_range(trial_days, 0, TRIAL_DAYS_MAX, "trial_days")?;

        let base = EntityBase::new();
        let events = vec![PlanEvent::PlanCreated {
            plan_id: base.id,
            name: name.clone(),
            price,
            interval,
        }];

        Ok(Self {
            base,
            name,
            price,
            interval,
            trial_days,
            is_active: true,
            events,
        })
    }

    /// Retired plans keep billing existing subscribers but accept no new ones.
    pub fn retire(&mut self) {
        if !self.is_active {
            return;
        }
        self.is_active = false;
        self.base.touch();
        self.events.push(PlanEvent::PlanRetired { plan_id: self.base.id });
    }
}

impl Entity for SubscriptionPlan {
    type Event = PlanEvent;
    const KIND: &'static str = "subscription_plan";
    const TOPIC: &'static str = "subscription-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<PlanEvent> {
        std::mem::take(&mut self.events)
    }
}

// ============================================================================
// Subscription
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(flatten)]
    pub base: EntityBase,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub started_at: DateTime<Utc>,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    /// Paid periods started so far; the trial is not counted.
    #[serde(default)]
    pub periods_billed: u32,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    events: Vec<SubscriptionEvent>,
}

impl Subscription {
    /// With a trial the first period ends with the trial.
    pub fn start(
        customer_id: Uuid,
        plan: &SubscriptionPlan,
        now: DateTime<Utc>,
    ) -> Result<Self, SubscriptionError> {
        let customer_id = guard::not_nil(customer_id, "customer_id")?;
        if !plan.is_active {
            return Err(SubscriptionError::PlanRetired(plan.base.id));
        }

        let (status, trial_ends_at, period_end, periods_billed) = if plan.trial_days > 0 {
            let trial_end = now + Duration::days(i64::from(plan.trial_days));
            (SubscriptionStatus::Trialing, Some(trial_end), trial_end, 0)
        } else {
            (SubscriptionStatus::Active, None, plan.interval.period_end(now, 1), 1)
        };

        let base = EntityBase::new();
        let events = vec![SubscriptionEvent::SubscriptionStarted {
            subscription_id: base.id,
            customer_id,
            plan_id: plan.base.id,
            trial_ends_at,
        }];

        Ok(Self {
            base,
            customer_id,
            plan_id: plan.base.id,
            status,
            started_at: now,
            current_period_start: now,
            current_period_end: period_end,
            periods_billed,
            trial_ends_at,
            cancel_at_period_end: false,
            cancelled_at: None,
            events,
        })
    }

    pub fn cancel(&mut self, at_period_end: bool, now: DateTime<Utc>) {
        if self.status == SubscriptionStatus::Cancelled {
            return;
        }

        if at_period_end {
            if self.cancel_at_period_end {
                return;
            }
            self.cancel_at_period_end = true;
            self.base.touch();
            self.events.push(SubscriptionEvent::SubscriptionCancellationScheduled {
                subscription_id: self.base.id,
                effective_at: self.current_period_end,
            });
            return;
        }

        self.end(now);
    }

    /// Advance one billing period. A scheduled cancellation ends the
    /// subscription at the current period end instead.
    pub fn renew(&mut self, interval: BillingInterval) -> Result<(), SubscriptionError> {
        if self.status == SubscriptionStatus::Cancelled {
            return Err(SubscriptionError::InvalidStatusTransition {
                action: "renew",
                status: self.status,
            });
        }
        if self.cancel_at_period_end {
            self.end(self.current_period_end);
            return Ok(());
        }

        let start = self.current_period_end;
        let periods_billed = self.periods_billed.saturating_add(1);
        let end = interval.period_end(self.billing_anchor(), periods_billed);
        self.status = SubscriptionStatus::Active;
        self.periods_billed = periods_billed;
        self.current_period_start = start;
        self.current_period_end = end;
        self.base.touch();
        self.events.push(SubscriptionEvent::SubscriptionRenewed {
            subscription_id: self.base.id,
            period_start: start,
            period_end: end,
        });
        Ok(())
    }

    /// Paid periods are counted from the end of the trial, if any.
    pub fn billing_anchor(&self) -> DateTime<Utc> {
        self.trial_ends_at.unwrap_or(self.started_at)
    }

    pub fn mark_past_due(&mut self) -> Result<(), SubscriptionError> {
        match self.status {
            SubscriptionStatus::Active | SubscriptionStatus::Trialing => {}
            SubscriptionStatus::PastDue => return Ok(()),
            status => {
                return Err(SubscriptionError::InvalidStatusTransition {
                    action: "mark past due",
                    status,
                })
            }
        }
        self.status = SubscriptionStatus::PastDue;
        self.base.touch();
        self.events.push(SubscriptionEvent::SubscriptionPastDue {
            subscription_id: self.base.id,
        });
        Ok(())
    }

    fn end(&mut self, at: DateTime<Utc>) {
        self.status = SubscriptionStatus::Cancelled;
        self.cancelled_at = Some(at);
        self.base.touch();
        self.events.push(SubscriptionEvent::SubscriptionCancelled {
            subscription_id: self.base.id,
        });
    }
}

impl Entity for Subscription {
    type Event = SubscriptionEvent;
    const KIND: &'static str = "subscription";
    const TOPIC: &'static str = "subscription-events";

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn take_events(&mut self) -> Vec<SubscriptionEvent> {
        std::mem::take(&mut self.events)
    }
}
