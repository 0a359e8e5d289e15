//! Static file serving behind the router.
//!
//! A [`StaticFileHandler`] is a terminal handler backed by a [`FileCache`]:
//! a keyed map of file metadata entries built on first request. Serving a
//! cached entry handles conditional GETs, HEAD, byte ranges, segmented
//! big-file transfer and a pre-compressed gzip sibling; bodies stream
//! through the bounded, lazily-opened [`FileStream`].

mod cache;
mod compress;
mod entry;
mod hooks;
mod range;
mod reader;
mod responder;

pub use cache::{static_file_middleware, FileCache, StaticFileHandler, StaticFileServerOptions};
pub use compress::{brotli_compress_file, gzip_compress_file};
pub use entry::FileCacheEntry;
pub use hooks::{
    CalcCacheEntryDataHook, FileNotFoundHook, FileServerHooks, RemoveCacheItemHook, RewriteBaseDirHook,
    RewriteCacheKeyHook, TooManyFilesHook,
};
pub use range::parse_byte_range;
pub use reader::FileStream;

/// Span served for one request on a big file.
///
/// Caps how much a single request can pull; a video player seeking around
/// re-requests with ranges instead of downloading the whole file.
pub const BIG_FILE_SEGMENT_SIZE: u64 = 1024 * 1024;

/// Size from which a file counts as big and is served one segment at a time.
pub const BIG_FILE_MIN_SIZE: u64 = BIG_FILE_SEGMENT_SIZE;

/// Files at this size and above are never pre-compressed.
pub const DONT_COMPRESS_OVER_SIZE: u64 = 1024 * 1024 * 50;
