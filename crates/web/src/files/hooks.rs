//! Optional hooks customizing the file cache.
//!
//! Every hook may be absent. Hooks that can re-enter the cache
//! (`on_too_many_files`, `on_remove_cache_item`) are always invoked outside
//! the cache's guards, so they are free to iterate and remove entries.

use super::cache::FileCache;
use super::entry::FileCacheEntry;
use lattice_http::{HttpRequest, ServeError};
use std::path::{Path, PathBuf};

/// Overrides the cache key, which defaults to the URL path. Incorporating a
/// user identity here gives each user its own cached variant of a URL.
pub type RewriteCacheKeyHook = Box<dyn Fn(&dyn HttpRequest) -> String + Send + Sync>;

/// Computes the opaque `data` tag stored on new entries.
pub type CalcCacheEntryDataHook = Box<dyn Fn(&dyn HttpRequest) -> String + Send + Sync>;

/// Overrides the base directory for one request.
pub type RewriteBaseDirHook = Box<dyn Fn(&dyn HttpRequest, &Path) -> PathBuf + Send + Sync>;

/// Called when the resolved file is missing; may synthesize it on disk, after
/// which the cache stats the path again.
pub type FileNotFoundHook = Box<dyn Fn(&dyn HttpRequest, &Path, &str) -> Result<(), ServeError> + Send + Sync>;

/// Called after an insert pushed the entry count over the configured
/// maximum; free to evict.
pub type TooManyFilesHook = Box<dyn Fn(&FileCache) + Send + Sync>;

/// Decides whether an entry selected for removal is actually removed. The
/// second argument is the selection discriminator passed to
/// [`FileCache::remove_exact_uri`].
pub type RemoveCacheItemHook = Box<dyn Fn(&FileCacheEntry, &str) -> bool + Send + Sync>;

/// Hook set for one [`FileCache`].
#[derive(Default)]
pub struct FileServerHooks {
    pub rewrite_cache_key: Option<RewriteCacheKeyHook>,
    pub calc_cache_entry_data: Option<CalcCacheEntryDataHook>,
    pub rewrite_base_dir: Option<RewriteBaseDirHook>,
    pub on_file_not_found: Option<FileNotFoundHook>,
    pub on_too_many_files: Option<TooManyFilesHook>,
    pub on_remove_cache_item: Option<RemoveCacheItemHook>,
}
