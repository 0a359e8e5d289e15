//! The file cache and its terminal handler.

use super::compress;
use super::entry::FileCacheEntry;
use super::hooks::FileServerHooks;
use super::responder;
use super::DONT_COMPRESS_OVER_SIZE;
use crate::handler::{HandlerResult, RequestHandler};
use async_trait::async_trait;
use lattice_http::{HttpRequest, ServeError};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Configuration for one [`FileCache`].
#[derive(Default)]
pub struct StaticFileServerOptions {
    pub hooks: FileServerHooks,
    /// Entry count above which `on_too_many_files` fires. Callers must set
    /// this explicitly — left at 0, an installed hook fires from the first
    /// insert onward.
    pub max_file_count: usize,
}

/// Keyed map of cached file metadata behind a URL prefix.
///
/// Reads take a shared guard; inserts, removals and bulk operations take the
/// exclusive guard. Per-entry counters are atomic, so hits never write-lock.
/// Two concurrent misses for one key may both build an entry — the last
/// insert wins, and both gzip builds write identical bytes to the same
/// sibling path, so the race is harmless.
pub struct FileCache {
    entries: RwLock<HashMap<String, Arc<FileCacheEntry>>>,
    base_dir: PathBuf,
    base_path: String,
    hooks: FileServerHooks,
    max_file_count: usize,
    file_count: AtomicUsize,
}

impl std::fmt::Debug for FileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCache")
            .field("base_dir", &self.base_dir)
            .field("base_path", &self.base_path)
            .field("max_file_count", &self.max_file_count)
            .field("file_count", &self.file_count)
            .finish()
    }
}

impl FileCache {
    /// Creates a cache serving `base_dir` under the URL prefix `base_path`.
    ///
    /// A leading `~` in `base_dir` expands to the user home; the result must
    /// name an existing directory, and is canonicalized so escape checks
    /// compare against a stable root.
    pub fn new(base_path: &str, base_dir: &Path, options: StaticFileServerOptions) -> Result<Self, ServeError> {
        let base_dir = normalize_base_dir(base_dir)?;

        Ok(Self {
            entries: RwLock::new(HashMap::new()),
            base_dir,
            base_path: base_path.to_string(),
            hooks: options.hooks,
            max_file_count: options.max_file_count,
            file_count: AtomicUsize::new(0),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Current entry count.
    pub fn len(&self) -> usize {
        self.file_count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serves the file for `req` from the cache, filling the missing entry
    /// on the way. Returns `false` when no file backs the request path, so
    /// the caller can fall through to its not-found reply.
    pub async fn try_send_file(&self, req: &mut dyn HttpRequest) -> Result<bool, ServeError> {
        let cache_key = match &self.hooks.rewrite_cache_key {
            Some(hook) => hook(&*req),
            None => req.path().to_string(),
        };

        let cached = { self.entries.read().unwrap().get(&cache_key).cloned() };
        if let Some(entry) = cached {
            debug!(key = %cache_key, "file cache hit");
            responder::send_entry(req, &entry).await?;
            return Ok(true);
        }

        let base_dir = match &self.hooks.rewrite_base_dir {
            Some(hook) => hook(&*req, &self.base_dir),
            None => self.base_dir.clone(),
        };
        let file_path = self.resolve_file_path(&base_dir, req.path())?;

        let Some(entry) = self.add_file_to_cache(req, &cache_key, file_path).await? else {
            return Ok(false);
        };
        responder::send_entry(req, &entry).await?;
        Ok(true)
    }

    /// Maps a URL path onto the base directory.
    ///
    /// A trailing `/` (or an empty path) lands on `index.html`. The joined
    /// path is cleaned lexically and must stay inside the base directory;
    /// anything escaping it is refused.
    fn resolve_file_path(&self, base_dir: &Path, url_path: &str) -> Result<PathBuf, ServeError> {
        let mut path = url_path.to_string();
        if path.is_empty() {
            path = "/index.html".to_string();
        } else if path.ends_with('/') {
            path.push_str("index.html");
        }

        let suffix = path.strip_prefix(&self.base_path).unwrap_or(&path);
        let full = lexical_clean(&base_dir.join(suffix.trim_start_matches('/')));

        if !full.starts_with(base_dir) {
            return Err(ServeError::forbidden(format!("path escapes the base directory: {url_path}")));
        }
        Ok(full)
    }

    async fn add_file_to_cache(
        &self,
        req: &mut dyn HttpRequest,
        cache_key: &str,
        file_path: PathBuf,
    ) -> Result<Option<Arc<FileCacheEntry>>, ServeError> {
        let data = match &self.hooks.calc_cache_entry_data {
            Some(hook) => hook(&*req),
            None => String::new(),
        };

        let mut stat = tokio::fs::metadata(&file_path).await;
        if stat.is_err() {
            if let Some(hook) = &self.hooks.on_file_not_found {
                hook(&*req, &file_path, &data)?;
                stat = tokio::fs::metadata(&file_path).await;
            }
        }
        let Ok(stat) = stat else {
            return Ok(None);
        };

        if stat.is_dir() {
            return Err(ServeError::forbidden(format!("cannot serve a directory: {}", file_path.display())));
        }

        let content_length = stat.len();
        let content_type = mime_guess::from_path(&file_path).first_or_octet_stream().to_string();
        let modified = stat.modified()?;

        let mut entry =
            FileCacheEntry::new(req.full_uri(), data, file_path.clone(), content_type, content_length, modified);

        if content_length < DONT_COMPRESS_OVER_SIZE {
            match compress::build_gzip_variant(&file_path).await {
                Ok((gzip_path, gzip_length)) => entry.set_gzip(gzip_path, gzip_length),
                Err(err) => {
                    // serve the raw file this once; the next request re-enters
                    // the miss path and retries the build
                    warn!(path = %file_path.display(), cause = %err, "dropping cache entry, gzip variant failed");
                    return Ok(Some(Arc::new(entry)));
                }
            }
        }

        let entry = Arc::new(entry);
        let count = {
            let mut entries = self.entries.write().unwrap();
            entries.insert(cache_key.to_string(), entry.clone());
            let count = entries.len();
            self.file_count.store(count, Ordering::Relaxed);
            count
        };
        debug!(key = %cache_key, count, "file cache insert");

        if count > self.max_file_count {
            if let Some(hook) = &self.hooks.on_too_many_files {
                hook(self);
            }
        }

        Ok(Some(entry))
    }

    /// Calls `visitor` on a snapshot of the entries, without holding any
    /// guard, so the visitor may remove entries while iterating.
    pub fn visit_entries(&self, visitor: &mut dyn FnMut(&Arc<FileCacheEntry>)) {
        let snapshot: Vec<Arc<FileCacheEntry>> = self.entries.read().unwrap().values().cloned().collect();
        for entry in &snapshot {
            visitor(entry);
        }
    }

    /// Removes the entry stored under `key`, leaving its files alone.
    pub fn remove_key(&self, key: &str) -> Option<Arc<FileCacheEntry>> {
        let mut entries = self.entries.write().unwrap();
        let removed = entries.remove(key);
        self.file_count.store(entries.len(), Ordering::Relaxed);
        removed
    }

    /// Empties the cache.
    ///
    /// With a removal hook installed, the hook decides entry by entry;
    /// without one, each removed entry's gzip sibling is deleted from disk.
    pub fn remove_all(&self) {
        match &self.hooks.on_remove_cache_item {
            None => {
                let drained: Vec<(String, Arc<FileCacheEntry>)> = {
                    let mut entries = self.entries.write().unwrap();
                    let drained = entries.drain().collect();
                    self.file_count.store(0, Ordering::Relaxed);
                    drained
                };
                for (_, entry) in drained {
                    if let Some(gzip) = entry.gzip_file_path() {
                        let _ = std::fs::remove_file(gzip);
                    }
                }
            }
            Some(hook) => {
                let snapshot: Vec<(String, Arc<FileCacheEntry>)> =
                    self.entries.read().unwrap().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                for (key, entry) in snapshot {
                    if hook(&entry, "") {
                        self.remove_key(&key);
                    }
                }
            }
        }
    }

    /// Removes the entries whose URI equals `uri`.
    ///
    /// With a removal hook installed, `data` is passed through as the
    /// selection discriminator so several entries under one URI can be
    /// pruned independently.
    pub fn remove_exact_uri(&self, uri: &str, data: &str) {
        let selected: Vec<(String, Arc<FileCacheEntry>)> = self
            .entries
            .read()
            .unwrap()
            .iter()
            .filter(|(_, entry)| entry.uri() == uri)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        match &self.hooks.on_remove_cache_item {
            None => {
                for (key, entry) in selected {
                    if self.remove_key(&key).is_some() {
                        if let Some(gzip) = entry.gzip_file_path() {
                            let _ = std::fs::remove_file(gzip);
                        }
                    }
                }
            }
            Some(hook) => {
                for (key, entry) in selected {
                    if hook(&entry, data) {
                        self.remove_key(&key);
                    }
                }
            }
        }
    }
}

/// Terminal handler serving static files through a [`FileCache`].
pub struct StaticFileHandler {
    cache: Arc<FileCache>,
}

impl StaticFileHandler {
    pub fn cache(&self) -> &Arc<FileCache> {
        &self.cache
    }
}

#[async_trait]
impl RequestHandler for StaticFileHandler {
    async fn handle(&self, req: &mut dyn HttpRequest) -> HandlerResult {
        if req.must_stop() {
            return Err(ServeError::Cancelled);
        }
        if self.cache.try_send_file(req).await? {
            Ok(())
        } else {
            Err(ServeError::not_found(req.path()))
        }
    }
}

/// Builds the static file middleware serving `base_dir` under `base_path`.
pub fn static_file_middleware(
    base_path: &str,
    base_dir: &Path,
    options: StaticFileServerOptions,
) -> Result<StaticFileHandler, ServeError> {
    Ok(StaticFileHandler { cache: Arc::new(FileCache::new(base_path, base_dir, options)?) })
}

fn normalize_base_dir(dir: &Path) -> Result<PathBuf, ServeError> {
    let dir = expand_home(dir);
    let dir = dir
        .canonicalize()
        .map_err(|_| ServeError::forbidden(format!("invalid base directory: {}", dir.display())))?;
    if !dir.is_dir() {
        return Err(ServeError::forbidden(format!("base directory is not a directory: {}", dir.display())));
    }
    Ok(dir)
}

fn expand_home(dir: &Path) -> PathBuf {
    let Some(text) = dir.to_str() else {
        return dir.to_path_buf();
    };
    if let Some(rest) = text.strip_prefix('~') {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest.trim_start_matches('/'));
        }
    }
    dir.to_path_buf()
}

/// Resolves `.` and `..` lexically, without touching the filesystem. A `..`
/// may pop past the base directory — callers detect that with a prefix
/// check.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}
