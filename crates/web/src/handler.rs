//! Request handler abstractions.
//!
//! Handlers and middlewares share one shape: an opaque callable bound to a
//! single entry point taking the request capability. Routes may carry an
//! arbitrary user tag next to the handler; the router never looks inside it.

use async_trait::async_trait;
use lattice_http::{HttpRequest, ServeError};
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Result produced by handlers and middlewares.
pub type HandlerResult = Result<(), ServeError>;

/// Opaque user tag attached to a route registration.
pub type RouteTag = Arc<dyn Any + Send + Sync>;

/// A handler bound to one entry point `(request) -> result`.
///
/// Both terminal handlers and middlewares implement this trait; a middleware
/// that wants to abort the chain raises the request's stop flag.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, req: &mut dyn HttpRequest) -> HandlerResult;
}

/// Boxed future returned by closure handlers.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'a>>;

/// Adapts a closure returning a boxed future into a [`RequestHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> RequestHandler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut dyn HttpRequest) -> HandlerFuture<'a> + Send + Sync,
{
    async fn handle(&self, req: &mut dyn HttpRequest) -> HandlerResult {
        (self.0)(req).await
    }
}

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut dyn HttpRequest) -> HandlerFuture<'a> + Send + Sync,
{
    FnHandler(f)
}
