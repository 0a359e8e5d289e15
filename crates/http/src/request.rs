//! The request capability consumed by the routing and file serving core.
//!
//! [`HttpRequest`] is the narrow seam between the core and its transport.
//! A transport adapter wraps its native request/response pair in this trait;
//! the router, middlewares and the file cache never see anything else. The
//! core calls the reply primitives at most once per request — the adapter's
//! body-sent flag is the authority on whether a response was started.

use crate::cookie::{Cookie, CookieOptions};
use crate::error::ServeError;
use crate::method::HttpMethod;
use crate::multipart::MultipartForm;
use crate::value_set::ValueSet;
use async_trait::async_trait;
use http::StatusCode;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::AsyncRead;

/// A streamed response body handed over to the transport adapter.
pub type BodyStream = Box<dyn AsyncRead + Send + Unpin>;

/// Capability interface over one in-flight request/response exchange.
#[async_trait]
pub trait HttpRequest: Send {
    // >>> Request identity

    fn method(&self) -> HttpMethod;

    fn method_name(&self) -> &str {
        self.method().as_str()
    }

    /// URL path, without the query string.
    fn path(&self) -> &str;

    /// The full request URI.
    fn full_uri(&self) -> String;

    fn scheme(&self) -> &str;

    /// Host header value, as received on the wire.
    fn host(&self) -> &str;

    fn query_string(&self) -> &str;

    fn remote_ip(&self) -> IpAddr;

    fn user_agent(&self) -> String {
        self.header("User-Agent").unwrap_or_default()
    }

    fn is_head(&self) -> bool {
        self.method() == HttpMethod::HEAD
    }

    // >>> Headers

    fn header(&self, name: &str) -> Option<String>;

    /// Sets a response header.
    fn set_header(&mut self, name: &str, value: &str);

    /// Snapshot of the request headers.
    fn headers(&self) -> HashMap<String, String>;

    fn content_type(&self) -> String;

    fn set_content_type(&mut self, content_type: &str);

    fn content_length(&self) -> usize;

    /// Whether the client's `Accept-Encoding` admits gzip.
    fn accepts_gzip(&self) -> bool {
        self.header("Accept-Encoding").map(|v| v.contains("gzip")).unwrap_or(false)
    }

    // >>> Arguments

    fn query_args(&self) -> &dyn ValueSet;

    fn post_args(&self) -> &dyn ValueSet;

    fn is_multipart_form(&self) -> bool;

    /// Parses the multipart form on first call and caches the result.
    async fn multipart_form(&mut self) -> Result<Arc<MultipartForm>, ServeError>;

    // >>> Cookies

    fn cookie(&self, name: &str) -> Option<Cookie>;

    fn cookies(&self) -> Vec<Cookie>;

    fn set_cookie(&mut self, name: &str, value: &str, options: CookieOptions) -> Result<(), ServeError>;

    // >>> Response

    /// Replies with a text body. Marks the body as sent.
    fn reply_with_string(&mut self, status: StatusCode, text: &str);

    /// Serves the file at `path` through the transport's own machinery.
    async fn send_file(&mut self, path: &Path) -> Result<(), ServeError>;

    /// Serves the file at `path` verbatim with an explicit mime type and,
    /// optionally, a `Content-Encoding` it was pre-encoded with.
    async fn send_file_as_is(
        &mut self,
        path: &Path,
        mime_type: &str,
        content_encoding: Option<&str>,
    ) -> Result<(), ServeError>;

    fn set_status(&mut self, status: StatusCode);

    /// Streams `body` as the response, announcing `content_length` bytes.
    /// Marks the body as sent.
    fn set_body_stream(&mut self, body: BodyStream, content_length: u64);

    /// Drops any body set so far.
    fn reset_body(&mut self);

    /// When set, the transport writes headers only (HEAD semantics).
    fn set_skip_body(&mut self, skip: bool);

    /// Whether a response body was already started for this request.
    fn is_body_sent(&self) -> bool;

    /// Resolves once the response has been fully written out.
    async fn wait_response(&mut self);

    // >>> Conditional requests

    /// Returns true when a resource modified at `modified` must be sent,
    /// i.e. the request carries no `If-Modified-Since` bound at or after it.
    fn if_modified_since(&self, modified: SystemTime) -> bool;

    /// Replies 304 with an empty body. Marks the body as sent.
    fn not_modified(&mut self);

    // >>> Route captures

    /// Captured prefix-wildcard values, in segment order.
    fn wildcards(&self) -> &[String];

    /// Path segments left unmatched by a catch-all rule.
    fn remaining_segments(&self) -> &[String];

    /// Stores the router's captures on the request.
    fn set_route_captures(&mut self, wildcards: Vec<String>, remaining: Vec<String>);

    // >>> Cancellation

    /// Monotonic stop flag, checked between middlewares.
    fn must_stop(&self) -> bool;

    fn stop(&mut self);
}
