// ============================================================================
// Mediator - CQRS request dispatch
// ============================================================================
//
// Every use case is a request type (command or query) with exactly one
// handler. Cross-cutting concerns (logging, validation, metrics) are
// pipeline behaviors wrapped around the handler.
//
// ============================================================================

mod behaviors;
mod dispatcher;
mod handler;
mod pipeline;
mod request;

pub use behaviors::{LoggingBehavior, MetricsBehavior, ValidationBehavior};
pub use dispatcher::{Mediator, MediatorBuildError, MediatorBuilder};
pub use handler::RequestHandler;
pub use pipeline::{ErasedResponse, Next, PipelineBehavior, RequestContext};
pub use request::{
    FieldError, Request, RequestKind, RequestMeta, Validate, ValidationErrors, Validator,
};
