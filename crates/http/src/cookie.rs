//! Cookie attributes forwarded to the transport adapter.
//!
//! Parsing and encoding of the `Cookie`/`Set-Cookie` wire formats stays in
//! the transport; the core only carries these attribute bags across the
//! capability boundary.

use std::time::SystemTime;

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Do not emit the attribute at all.
    #[default]
    Disabled,
    /// Emit the attribute without a value, leaving the default to the client.
    DefaultMode,
    Lax,
    Strict,
    None,
}

/// Attributes applied when setting a cookie.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub domain: String,
    pub expire_time: Option<SystemTime>,
    /// Max-Age in seconds.
    pub max_age: Option<i64>,
}

/// A cookie as read back from the request.
#[derive(Debug, Clone, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub domain: String,
    pub expire_time: Option<SystemTime>,
    pub max_age: Option<i64>,
}

impl Cookie {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self { name: name.into(), value: value.into(), ..Default::default() }
    }

    /// Builds a read model from a value plus the options it was set with.
    pub fn from_options<N: Into<String>, V: Into<String>>(name: N, value: V, options: &CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            http_only: options.http_only,
            secure: options.secure,
            same_site: options.same_site,
            domain: options.domain.clone(),
            expire_time: options.expire_time,
            max_age: options.max_age,
        }
    }
}
