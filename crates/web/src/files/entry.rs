use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Metadata for one cached file.
///
/// Entries are shared behind `Arc` and mutated only through the atomic
/// counters, so concurrent hits never need the cache's write guard.
pub struct FileCacheEntry {
    uri: String,
    /// Opaque discriminator set by the entry-data hook, allowing several
    /// entries for the same URI (e.g. per-user variants).
    data: String,

    file_path: PathBuf,
    content_type: String,
    content_length: u64,

    gzip_file_path: Option<PathBuf>,
    gzip_content_length: u64,

    file_update_date: SystemTime,
    /// Milliseconds since the epoch; relaxed updates are fine, late writers
    /// only make the stamp fresher.
    last_requested_date: AtomicU64,
    hit_count: AtomicU64,
}

impl FileCacheEntry {
    pub(crate) fn new(
        uri: String,
        data: String,
        file_path: PathBuf,
        content_type: String,
        content_length: u64,
        file_update_date: SystemTime,
    ) -> Self {
        Self {
            uri,
            data,
            file_path,
            content_type,
            content_length,
            gzip_file_path: None,
            gzip_content_length: 0,
            file_update_date,
            last_requested_date: AtomicU64::new(unix_millis(SystemTime::now())),
            hit_count: AtomicU64::new(0),
        }
    }

    pub(crate) fn set_gzip(&mut self, path: PathBuf, content_length: u64) {
        self.gzip_file_path = Some(path);
        self.gzip_content_length = content_length;
    }

    /// Bumps the hit counter and refreshes the last-served stamp.
    pub(crate) fn touch(&self) {
        self.hit_count.fetch_add(1, Ordering::Relaxed);
        self.last_requested_date.store(unix_millis(SystemTime::now()), Ordering::Relaxed);
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// The pre-compressed sibling, when one was built.
    pub fn gzip_file_path(&self) -> Option<&Path> {
        self.gzip_file_path.as_deref()
    }

    pub fn gzip_content_length(&self) -> u64 {
        self.gzip_content_length
    }

    pub fn file_update_date(&self) -> SystemTime {
        self.file_update_date
    }

    pub fn last_requested_date(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.last_requested_date.load(Ordering::Relaxed))
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count.load(Ordering::Relaxed)
    }
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}
