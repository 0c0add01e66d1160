use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::error::AppError;
use super::request::{RequestMeta, Validate};

// ============================================================================
// Pipeline Behaviors
// ============================================================================
//
// Behaviors wrap handler execution. The first registered behavior is the
// outermost one. Responses are type-erased while they travel through the
// chain and downcast by the mediator at the end.
//
// ============================================================================

pub type ErasedResponse = Box<dyn Any + Send>;

pub type Terminal<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<ErasedResponse, AppError>> + Send + 'a>;

/// What a behavior can see of the request in flight.
pub struct RequestContext<'a> {
    pub meta: &'a RequestMeta,
    pub request: &'a (dyn Validate + Sync),
}

#[async_trait]
pub trait PipelineBehavior: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        next: Next<'_>,
    ) -> Result<ErasedResponse, AppError>;
}

/// The rest of the chain after the current behavior.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn PipelineBehavior>],
    ctx: &'a RequestContext<'a>,
    terminal: Terminal<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        behaviors: &'a [Arc<dyn PipelineBehavior>],
        ctx: &'a RequestContext<'a>,
        terminal: Terminal<'a>,
    ) -> Self {
        Self {
            remaining: behaviors,
            ctx,
            terminal,
        }
    }

    pub async fn run(self) -> Result<ErasedResponse, AppError> {
        match self.remaining.split_first() {
            Some((behavior, rest)) => {
                let next = Next {
                    remaining: rest,
                    ctx: self.ctx,
                    terminal: self.terminal,
                };
                behavior.handle(self.ctx, next).await
            }
            None => (self.terminal)().await,
        }
    }
}
