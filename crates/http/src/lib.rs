//! lattice-http — the request capability interface of the lattice serving
//! library.
//!
//! The actual HTTP transport (socket accept, request parsing, TLS, cookie
//! wire formats, multipart decoding) is an external collaborator. Everything
//! the routing and file-serving core needs from a request goes through the
//! [`HttpRequest`] trait defined here, so any transport that can implement it
//! can host the core.

pub mod cookie;
pub mod error;
pub mod method;
pub mod multipart;
pub mod request;
pub mod value_set;

pub use cookie::{Cookie, CookieOptions, SameSite};
pub use error::ServeError;
pub use method::HttpMethod;
pub use multipart::{MultipartFile, MultipartForm};
pub use request::{BodyStream, HttpRequest};
pub use value_set::{UrlEncodedValues, ValueError, ValueSet};
