//! Virtual hosts and the request dispatch loop.

use crate::handler::{RequestHandler, RouteTag};
use crate::router::Router;
use http::StatusCode;
use lattice_http::{HttpMethod, HttpRequest, ServeError};
use std::sync::{Arc, RwLock};
use tracing::{debug, error};

type ErrorHandlerFn = Arc<dyn Fn(&mut dyn HttpRequest, &ServeError) + Send + Sync>;

/// One virtual host: a name plus one URL resolver per HTTP method.
///
/// Resolvers are built during startup and read-mostly afterwards; mutation
/// goes through the per-method `RwLock`, and a resolve clones the shared
/// handler and chain handles before the guard is released, so no lock is
/// held while handlers run.
pub struct HttpHost {
    host_name: String,
    resolvers: [RwLock<Router>; HttpMethod::COUNT],
    not_found_handler: RwLock<Option<Arc<dyn RequestHandler>>>,
    error_handler: RwLock<Option<ErrorHandlerFn>>,
}

macro_rules! host_verb {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Binds `handler` to `path` for ", stringify!($method), " requests.")]
        pub fn $name<H: RequestHandler + 'static>(&self, path: &str, handler: H) {
            self.add_route(HttpMethod::$method, path, Arc::new(handler), None);
        }
    };
}

impl HttpHost {
    pub fn new<S: Into<String>>(host_name: S) -> Arc<Self> {
        Arc::new(Self {
            host_name: host_name.into(),
            resolvers: std::array::from_fn(|_| RwLock::new(Router::new())),
            not_found_handler: RwLock::new(None),
            error_handler: RwLock::new(None),
        })
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// The resolver registered for `method`.
    pub fn resolver(&self, method: HttpMethod) -> &RwLock<Router> {
        &self.resolvers[method.index()]
    }

    /// Binds `handler` to `path` for the method named `verb`.
    pub fn verb<H: RequestHandler + 'static>(&self, verb: &str, path: &str, handler: H) {
        self.add_route(HttpMethod::from_name(verb), path, Arc::new(handler), None);
    }

    host_verb!(get, GET);
    host_verb!(post, POST);
    host_verb!(head, HEAD);
    host_verb!(put, PUT);
    host_verb!(delete, DELETE);
    host_verb!(connect, CONNECT);
    host_verb!(options, OPTIONS);
    host_verb!(trace, TRACE);
    host_verb!(patch, PATCH);

    /// Binds a shared handler with an optional tag.
    pub fn add_route(&self, method: HttpMethod, path: &str, handler: Arc<dyn RequestHandler>, tag: Option<RouteTag>) {
        let mut resolver = self.resolvers[method.index()].write().unwrap();
        resolver.add(path, handler, tag);
    }

    /// Registers a middleware for `method` at `path` (exact) or, with a
    /// trailing `/*`, for every path below it.
    pub fn append_middleware<H: RequestHandler + 'static>(&self, method: HttpMethod, path: &str, handler: H) {
        let mut resolver = self.resolvers[method.index()].write().unwrap();
        resolver.append_middleware(path, Arc::new(handler), None);
    }

    /// Replaces the default not-found reply.
    pub fn set_not_found_handler<H: RequestHandler + 'static>(&self, handler: H) {
        *self.not_found_handler.write().unwrap() = Some(Arc::new(handler));
    }

    /// Replaces the default error reply.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(&mut dyn HttpRequest, &ServeError) + Send + Sync + 'static,
    {
        *self.error_handler.write().unwrap() = Some(Arc::new(handler));
    }

    /// Resolves and serves one request.
    ///
    /// Middlewares run strictly in chain order and may abort the rest of the
    /// chain by raising the request's stop flag; the terminal handler is then
    /// skipped. Errors map onto responses per kind: `NotFound` goes through
    /// the not-found reply, `RangeNotSatisfiable` replies 416, `Cancelled`
    /// stays silent, everything else goes through the error reply.
    pub async fn handle_request(&self, req: &mut dyn HttpRequest) {
        let matched = {
            let resolver = self.resolvers[req.method().index()].read().unwrap();
            resolver.find(req.path())
        };

        let Some(target) = matched.target().cloned() else {
            self.reply_not_found(req).await;
            return;
        };

        req.set_route_captures(matched.wildcards(), matched.remaining_segments().to_vec());

        for middleware in matched.middlewares() {
            if let Err(err) = middleware.handle(req).await {
                self.reply_error(req, err).await;
                return;
            }
            if req.must_stop() {
                return;
            }
        }

        if let Err(err) = target.handle(req).await {
            self.reply_error(req, err).await;
        }
    }

    /// Sends the host's not-found reply.
    pub async fn reply_not_found(&self, req: &mut dyn HttpRequest) {
        let custom = self.not_found_handler.read().unwrap().clone();
        match custom {
            Some(handler) => {
                if let Err(err) = handler.handle(req).await {
                    error!(host = %self.host_name, cause = %err, "not-found handler failed");
                }
            }
            None => req.reply_with_string(StatusCode::NOT_FOUND, "not found"),
        }
    }

    async fn reply_error(&self, req: &mut dyn HttpRequest, err: ServeError) {
        match &err {
            ServeError::NotFound { .. } => {
                self.reply_not_found(req).await;
            }
            ServeError::Cancelled => {
                debug!(host = %self.host_name, "request cancelled");
            }
            ServeError::RangeNotSatisfiable { .. } => {
                if !req.is_body_sent() {
                    req.reply_with_string(StatusCode::RANGE_NOT_SATISFIABLE, "range not satisfiable");
                }
            }
            _ => {
                if req.is_body_sent() {
                    // headers are out; nothing more can be said to the client
                    error!(host = %self.host_name, cause = %err, "request failed mid-response");
                    return;
                }
                let custom = self.error_handler.read().unwrap().clone();
                match custom {
                    Some(handler) => handler(req, &err),
                    None => req.reply_with_string(StatusCode::INTERNAL_SERVER_ERROR, "error"),
                }
            }
        }
    }
}
