use async_trait::async_trait;

use crate::error::AppError;
use super::request::{Request, RequestMeta};

/// Handles exactly one request type.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: &R, meta: &RequestMeta) -> Result<R::Response, AppError>;
}
