//! Multipart form data as delivered by the transport adapter.
//!
//! Wire-level multipart parsing happens in the transport; the core only sees
//! the decoded values and file parts, retrieved lazily through
//! [`HttpRequest::multipart_form`](crate::request::HttpRequest::multipart_form)
//! and cached for the lifetime of the request.

use bytes::Bytes;
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// A decoded multipart form.
#[derive(Debug, Default, Clone)]
pub struct MultipartForm {
    /// Plain text fields, grouped by field name.
    pub values: HashMap<String, Vec<String>>,
    /// Uploaded files, grouped by field name.
    pub files: HashMap<String, Vec<MultipartFile>>,
}

impl MultipartForm {
    /// First text value registered under `name`.
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// First file registered under `name`.
    pub fn first_file(&self, name: &str) -> Option<&MultipartFile> {
        self.files.get(name).and_then(|v| v.first())
    }
}

/// One uploaded file part.
#[derive(Debug, Clone)]
pub struct MultipartFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl MultipartFile {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Writes the part's content to `path`, creating missing parent
    /// directories first.
    pub async fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &self.data).await
    }
}
