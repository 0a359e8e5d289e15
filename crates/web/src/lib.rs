//! lattice-web — the core of the lattice HTTP serving library.
//!
//! Two subsystems do the real work here. The [`router`] maps an incoming
//! method + path onto a handler plus an ordered middleware chain, supporting
//! literal segments, prefix wildcards (`/products/listing*`) and catch-all
//! tails (`/assets/*`). The [`files`] subsystem sits behind the router and
//! serves files from disk with conditional requests, byte ranges, segmented
//! big-file transfer and on-demand gzip pre-compression.
//!
//! Around them, [`host`] holds one resolver per HTTP method for each virtual
//! host and runs the dispatch loop, and [`registry`] records which server
//! answers on which port. The HTTP transport itself stays outside this
//! crate, behind [`lattice_http::HttpRequest`].

pub mod files;
pub mod handler;
pub mod host;
pub mod registry;
pub mod router;
pub mod spy;

pub use files::{
    static_file_middleware, FileCache, FileCacheEntry, FileServerHooks, FileStream, StaticFileHandler,
    StaticFileServerOptions,
};
pub use handler::{handler_fn, FnHandler, HandlerResult, RequestHandler, RouteTag};
pub use host::HttpHost;
pub use registry::{clear_servers, register_server, remove_server, server_for_port, VirtualServer};
pub use router::{RouteMatch, Router, TreeItem};
pub use spy::ResponseSpy;
