//! Test double for the transport adapter.
#![allow(dead_code)]

use async_trait::async_trait;
use http::StatusCode;
use lattice_http::{
    BodyStream, Cookie, CookieOptions, HttpMethod, HttpRequest, MultipartForm, ServeError, UrlEncodedValues,
    ValueSet,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncReadExt;

/// An in-memory request/response pair implementing the capability trait.
pub struct MockRequest {
    pub method: HttpMethod,
    pub path: String,
    pub host: String,
    pub request_headers: HashMap<String, String>,

    pub status: Option<StatusCode>,
    pub response_text: String,
    pub response_headers: HashMap<String, String>,
    pub response_content_type: Option<String>,
    pub body: Vec<u8>,
    pub announced_length: Option<u64>,
    pub skip_body: bool,
    pub body_sent: bool,

    pub route_wildcards: Vec<String>,
    pub route_remaining: Vec<String>,
    pub stopped: bool,
    pub cookies_set: Vec<(String, String, CookieOptions)>,

    query: UrlEncodedValues,
    post: UrlEncodedValues,
    body_stream: Option<BodyStream>,
    multipart: Arc<MultipartForm>,
}

impl MockRequest {
    pub fn new(method: HttpMethod, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            host: "localhost".to_string(),
            request_headers: HashMap::new(),
            status: None,
            response_text: String::new(),
            response_headers: HashMap::new(),
            response_content_type: None,
            body: Vec::new(),
            announced_length: None,
            skip_body: false,
            body_sent: false,
            route_wildcards: Vec::new(),
            route_remaining: Vec::new(),
            stopped: false,
            cookies_set: Vec::new(),
            query: UrlEncodedValues::empty(),
            post: UrlEncodedValues::empty(),
            body_stream: None,
            multipart: Arc::new(MultipartForm::default()),
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(HttpMethod::GET, path)
    }

    pub fn head(path: &str) -> Self {
        Self::new(HttpMethod::HEAD, path)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.request_headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, raw: &str) -> Self {
        self.query = UrlEncodedValues::parse(raw);
        self
    }

    /// Drains the streamed body, if any, and returns the final body bytes.
    pub async fn collect_body(&mut self) -> Vec<u8> {
        if let Some(mut stream) = self.body_stream.take() {
            let mut out = Vec::new();
            stream.read_to_end(&mut out).await.expect("body stream must read to end");
            self.body = out;
        }
        if self.skip_body {
            return Vec::new();
        }
        self.body.clone()
    }

    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response_headers.get(name).map(String::as_str)
    }
}

#[async_trait]
impl HttpRequest for MockRequest {
    fn method(&self) -> HttpMethod {
        self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn full_uri(&self) -> String {
        format!("http://{}{}", self.host, self.path)
    }

    fn scheme(&self) -> &str {
        "http"
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn query_string(&self) -> &str {
        ""
    }

    fn remote_ip(&self) -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    fn header(&self, name: &str) -> Option<String> {
        self.request_headers.get(name).cloned()
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.response_headers.insert(name.to_string(), value.to_string());
    }

    fn headers(&self) -> HashMap<String, String> {
        self.request_headers.clone()
    }

    fn content_type(&self) -> String {
        self.request_headers.get("Content-Type").cloned().unwrap_or_default()
    }

    fn set_content_type(&mut self, content_type: &str) {
        self.response_content_type = Some(content_type.to_string());
    }

    fn content_length(&self) -> usize {
        0
    }

    fn query_args(&self) -> &dyn ValueSet {
        &self.query
    }

    fn post_args(&self) -> &dyn ValueSet {
        &self.post
    }

    fn is_multipart_form(&self) -> bool {
        false
    }

    async fn multipart_form(&mut self) -> Result<Arc<MultipartForm>, ServeError> {
        Ok(self.multipart.clone())
    }

    fn cookie(&self, _name: &str) -> Option<Cookie> {
        None
    }

    fn cookies(&self) -> Vec<Cookie> {
        Vec::new()
    }

    fn set_cookie(&mut self, name: &str, value: &str, options: CookieOptions) -> Result<(), ServeError> {
        self.cookies_set.push((name.to_string(), value.to_string(), options));
        Ok(())
    }

    fn reply_with_string(&mut self, status: StatusCode, text: &str) {
        self.status = Some(status);
        self.response_text = text.to_string();
        self.body = text.as_bytes().to_vec();
        self.body_sent = true;
    }

    async fn send_file(&mut self, path: &Path) -> Result<(), ServeError> {
        self.body = tokio::fs::read(path).await?;
        self.status = Some(StatusCode::OK);
        self.body_sent = true;
        Ok(())
    }

    async fn send_file_as_is(
        &mut self,
        path: &Path,
        mime_type: &str,
        content_encoding: Option<&str>,
    ) -> Result<(), ServeError> {
        self.body = tokio::fs::read(path).await?;
        self.response_content_type = Some(mime_type.to_string());
        if let Some(encoding) = content_encoding {
            self.response_headers.insert("Content-Encoding".to_string(), encoding.to_string());
        }
        self.status = Some(StatusCode::OK);
        self.body_sent = true;
        Ok(())
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn set_body_stream(&mut self, body: BodyStream, content_length: u64) {
        self.body_stream = Some(body);
        self.announced_length = Some(content_length);
        self.body_sent = true;
    }

    fn reset_body(&mut self) {
        self.body.clear();
        self.body_stream = None;
    }

    fn set_skip_body(&mut self, skip: bool) {
        self.skip_body = skip;
    }

    fn is_body_sent(&self) -> bool {
        self.body_sent
    }

    async fn wait_response(&mut self) {}

    fn if_modified_since(&self, modified: SystemTime) -> bool {
        match self.request_headers.get("If-Modified-Since").and_then(|v| httpdate::parse_http_date(v).ok()) {
            // header granularity is one second
            Some(since) => truncate_to_seconds(modified) > since,
            None => true,
        }
    }

    fn not_modified(&mut self) {
        self.status = Some(StatusCode::NOT_MODIFIED);
        self.body.clear();
        self.body_stream = None;
        self.body_sent = true;
    }

    fn wildcards(&self) -> &[String] {
        &self.route_wildcards
    }

    fn remaining_segments(&self) -> &[String] {
        &self.route_remaining
    }

    fn set_route_captures(&mut self, wildcards: Vec<String>, remaining: Vec<String>) {
        self.route_wildcards = wildcards;
        self.route_remaining = remaining;
    }

    fn must_stop(&self) -> bool {
        self.stopped
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

fn truncate_to_seconds(time: SystemTime) -> SystemTime {
    let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    UNIX_EPOCH + Duration::from_secs(since_epoch.as_secs())
}
