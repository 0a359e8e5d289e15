//! Response spying decorator.
//!
//! [`ResponseSpy`] wraps a request and records what the wrapped handlers
//! reply — status, text, content type and response headers — while
//! delegating everything to the underlying request. A caching middleware
//! runs the rest of the chain through a spy and stores what went out.

use async_trait::async_trait;
use http::StatusCode;
use lattice_http::{
    BodyStream, Cookie, CookieOptions, HttpMethod, HttpRequest, MultipartForm, ServeError, ValueSet,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

/// Records the response sent through it.
pub struct ResponseSpy<'a> {
    inner: &'a mut dyn HttpRequest,
    status: Option<StatusCode>,
    response_text: String,
    content_type: Option<String>,
    headers: HashMap<String, String>,
}

impl<'a> ResponseSpy<'a> {
    pub fn new(inner: &'a mut dyn HttpRequest) -> Self {
        Self { inner, status: None, response_text: String::new(), content_type: None, headers: HashMap::new() }
    }

    /// The status replied through the spy, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The text replied through the spy.
    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    /// The content type set through the spy, if any.
    pub fn captured_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// The response headers set through the spy.
    pub fn captured_headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

#[async_trait]
impl HttpRequest for ResponseSpy<'_> {
    fn method(&self) -> HttpMethod {
        self.inner.method()
    }

    fn path(&self) -> &str {
        self.inner.path()
    }

    fn full_uri(&self) -> String {
        self.inner.full_uri()
    }

    fn scheme(&self) -> &str {
        self.inner.scheme()
    }

    fn host(&self) -> &str {
        self.inner.host()
    }

    fn query_string(&self) -> &str {
        self.inner.query_string()
    }

    fn remote_ip(&self) -> IpAddr {
        self.inner.remote_ip()
    }

    fn header(&self, name: &str) -> Option<String> {
        self.inner.header(name)
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
        self.inner.set_header(name, value);
    }

    fn headers(&self) -> HashMap<String, String> {
        self.inner.headers()
    }

    fn content_type(&self) -> String {
        self.inner.content_type()
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.content_type = Some(content_type.to_string());
        self.inner.set_content_type(content_type);
    }

    fn content_length(&self) -> usize {
        self.inner.content_length()
    }

    fn query_args(&self) -> &dyn ValueSet {
        self.inner.query_args()
    }

    fn post_args(&self) -> &dyn ValueSet {
        self.inner.post_args()
    }

    fn is_multipart_form(&self) -> bool {
        self.inner.is_multipart_form()
    }

    async fn multipart_form(&mut self) -> Result<Arc<MultipartForm>, ServeError> {
        self.inner.multipart_form().await
    }

    fn cookie(&self, name: &str) -> Option<Cookie> {
        self.inner.cookie(name)
    }

    fn cookies(&self) -> Vec<Cookie> {
        self.inner.cookies()
    }

    fn set_cookie(&mut self, name: &str, value: &str, options: CookieOptions) -> Result<(), ServeError> {
        self.inner.set_cookie(name, value, options)
    }

    fn reply_with_string(&mut self, status: StatusCode, text: &str) {
        self.status = Some(status);
        self.response_text = text.to_string();
        self.inner.reply_with_string(status, text);
    }

    async fn send_file(&mut self, path: &Path) -> Result<(), ServeError> {
        self.inner.send_file(path).await
    }

    async fn send_file_as_is(
        &mut self,
        path: &Path,
        mime_type: &str,
        content_encoding: Option<&str>,
    ) -> Result<(), ServeError> {
        self.inner.send_file_as_is(path, mime_type, content_encoding).await
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
        self.inner.set_status(status);
    }

    fn set_body_stream(&mut self, body: BodyStream, content_length: u64) {
        self.inner.set_body_stream(body, content_length);
    }

    fn reset_body(&mut self) {
        self.inner.reset_body();
    }

    fn set_skip_body(&mut self, skip: bool) {
        self.inner.set_skip_body(skip);
    }

    fn is_body_sent(&self) -> bool {
        self.inner.is_body_sent()
    }

    async fn wait_response(&mut self) {
        self.inner.wait_response().await;
    }

    fn if_modified_since(&self, modified: SystemTime) -> bool {
        self.inner.if_modified_since(modified)
    }

    fn not_modified(&mut self) {
        self.status = Some(StatusCode::NOT_MODIFIED);
        self.inner.not_modified();
    }

    fn wildcards(&self) -> &[String] {
        self.inner.wildcards()
    }

    fn remaining_segments(&self) -> &[String] {
        self.inner.remaining_segments()
    }

    fn set_route_captures(&mut self, wildcards: Vec<String>, remaining: Vec<String>) {
        self.inner.set_route_captures(wildcards, remaining);
    }

    fn must_stop(&self) -> bool {
        self.inner.must_stop()
    }

    fn stop(&mut self) {
        self.inner.stop();
    }
}
