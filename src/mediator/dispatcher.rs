use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::AppError;
use crate::utils::{retry_on_transient, RetryConfig};
use super::handler::RequestHandler;
use super::pipeline::{ErasedResponse, Next, PipelineBehavior, RequestContext, Terminal};
use super::request::{Request, RequestMeta};

// ============================================================================
// Mediator - routes a typed request to exactly one handler
// ============================================================================
//
// Flow:
//   send(request)
//     → look up the handler registered for the request type
//     → run pipeline behaviors (outermost first)
//     → handler
//     → downcast the erased response back to R::Response
//
// Requests marked `retry_on_conflict` repeat the whole pipeline while it
// fails with `AppError::Conflict`, under the mediator's conflict policy.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MediatorBuildError {
    #[error("A handler is already registered for request {0}")]
    DuplicateHandler(&'static str),
}

struct HandlerEntry {
    name: &'static str,
    // Holds an `Arc<dyn RequestHandler<R>>` for the keyed request type.
    handler: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct MediatorBuilder {
    handlers: HashMap<TypeId, HandlerEntry>,
    behaviors: Vec<Arc<dyn PipelineBehavior>>,
    duplicates: Vec<&'static str>,
    conflict_retry: Option<RetryConfig>,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaviors wrap in registration order: first added is outermost.
    pub fn behavior(mut self, behavior: impl PipelineBehavior + 'static) -> Self {
        self.behaviors.push(Arc::new(behavior));
        self
    }

    /// Policy for requests that opt into conflict retries.
    pub fn retry_conflicts(mut self, config: RetryConfig) -> Self {
        self.conflict_retry = Some(config);
        self
    }

    pub fn handler<R, H>(mut self, handler: H) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        self.register::<R>(Arc::new(handler));
        self
    }

    /// Register a shared handler; one handler value may serve many requests.
    pub fn register<R: Request>(&mut self, handler: Arc<dyn RequestHandler<R>>) {
        let key = TypeId::of::<R>();
        if self.handlers.contains_key(&key) {
            self.duplicates.push(R::NAME);
            return;
        }
        self.handlers.insert(
            key,
            HandlerEntry {
                name: R::NAME,
                handler: Box::new(handler),
            },
        );
    }

    pub fn build(self) -> Result<Mediator, MediatorBuildError> {
        if let Some(name) = self.duplicates.first() {
            return Err(MediatorBuildError::DuplicateHandler(*name));
        }

        tracing::debug!(
            handler_count = self.handlers.len(),
            behaviors = ?self.behaviors.iter().map(|b| b.name()).collect::<Vec<_>>(),
            "Mediator built"
        );

        Ok(Mediator {
            handlers: Arc::new(self.handlers),
            behaviors: Arc::new(self.behaviors),
            conflict_retry: self.conflict_retry,
        })
    }
}

#[derive(Clone)]
pub struct Mediator {
    handlers: Arc<HashMap<TypeId, HandlerEntry>>,
    behaviors: Arc<Vec<Arc<dyn PipelineBehavior>>>,
    conflict_retry: Option<RetryConfig>,
}

impl Mediator {
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_registered<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    pub fn registered_requests(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.values().map(|e| e.name).collect();
        names.sort_unstable();
        names
    }

    /// Send a request with fresh metadata.
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response, AppError> {
        self.send_with_meta(request, RequestMeta::for_request::<R>()).await
    }

    pub async fn send_with_meta<R: Request>(
        &self,
        request: R,
        meta: RequestMeta,
    ) -> Result<R::Response, AppError> {
        match &self.conflict_retry {
            Some(config) if R::RETRY_ON_CONFLICT => {
                self.dispatch_with_retry(&request, meta, config.clone()).await
            }
            _ => self.dispatch(&request, &meta).await,
        }
    }

    /// Re-send any request while it fails with a transient error, whether or
    /// not it opted into conflict retries.
    pub async fn send_with_retry<R: Request>(
        &self,
        request: R,
        config: RetryConfig,
    ) -> Result<R::Response, AppError> {
        self.dispatch_with_retry(&request, RequestMeta::for_request::<R>(), config)
            .await
    }

    /// Every attempt shares the correlation id of `meta`.
    async fn dispatch_with_retry<R: Request>(
        &self,
        request: &R,
        meta: RequestMeta,
        config: RetryConfig,
    ) -> Result<R::Response, AppError> {
        let meta = &meta;
        retry_on_transient(config, |attempt| async move {
            if attempt > 1 {
                tracing::info!(
                    request = R::NAME,
                    attempt,
                    correlation_id = %meta.correlation_id,
                    "Retrying request after conflict"
                );
            }
            self.dispatch(request, meta).await
        })
        .await
        .into_result()
    }

    async fn dispatch<R: Request>(
        &self,
        request: &R,
        meta: &RequestMeta,
    ) -> Result<R::Response, AppError> {
        let handler = self
            .handlers
            .get(&TypeId::of::<R>())
            .and_then(|entry| entry.handler.downcast_ref::<Arc<dyn RequestHandler<R>>>())
            .cloned()
            .ok_or(AppError::HandlerNotRegistered(R::NAME))?;

        let ctx = RequestContext { meta, request };

        let terminal = terminal_for(handler, request, meta);
        let erased = Next::new(&self.behaviors, &ctx, terminal).run().await?;

        erased
            .downcast::<R::Response>()
            .map(|response| *response)
            .map_err(|_| {
                AppError::Internal(anyhow::anyhow!(
                    "Pipeline returned an unexpected response type for {}",
                    R::NAME
                ))
            })
    }
}

fn terminal_for<'a, R: Request>(
    handler: Arc<dyn RequestHandler<R>>,
    request: &'a R,
    meta: &'a RequestMeta,
) -> Terminal<'a> {
    Box::new(move || {
        let fut: BoxFuture<'a, Result<ErasedResponse, AppError>> = Box::pin(async move {
            let response = handler.handle(request, meta).await?;
            Ok::<ErasedResponse, AppError>(Box::new(response))
        });
        fut
    })
}
