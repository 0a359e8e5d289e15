//! Turns a cache entry into a response.

use super::entry::FileCacheEntry;
use super::range::parse_byte_range;
use super::reader::FileStream;
use super::{BIG_FILE_MIN_SIZE, BIG_FILE_SEGMENT_SIZE};
use http::StatusCode;
use lattice_http::{HttpRequest, ServeError};
use std::path::Path;
use tracing::trace;

/// Serves `entry` on `req`.
///
/// Handles, in order: the at-most-one-response guarantee, conditional GET
/// (304), variant selection (the gzip sibling when the client accepts it),
/// HEAD, byte ranges clamped to one segment, and the unsolicited first
/// segment for big files. The status is written last; after that the
/// responder never touches the request again.
pub(crate) async fn send_entry(req: &mut dyn HttpRequest, entry: &FileCacheEntry) -> Result<(), ServeError> {
    if req.is_body_sent() {
        return Ok(());
    }

    entry.touch();

    if !req.if_modified_since(entry.file_update_date()) {
        req.not_modified();
        return Ok(());
    }

    req.set_header("Last-Modified", &httpdate::fmt_http_date(entry.file_update_date()));

    let (file_path, total_length, is_gzip): (&Path, u64, bool) = match entry.gzip_file_path() {
        Some(gzip_path) if req.accepts_gzip() => (gzip_path, entry.gzip_content_length(), true),
        _ => (entry.file_path(), entry.content_length(), false),
    };

    if req.is_head() {
        req.reset_body();
        req.set_skip_body(true);
        req.set_content_type(entry.content_type());
        req.set_header("Content-Length", &total_length.to_string());
        if is_gzip {
            req.set_header("Content-Encoding", "gzip");
        }
        req.set_status(StatusCode::OK);
        return Ok(());
    }

    let mut reader = FileStream::new(file_path);
    let mut status = StatusCode::OK;
    let mut content_length = total_length;

    if let Some(range_header) = req.header("Range") {
        let (start, mut end) = parse_byte_range(&range_header, total_length)?;

        // cap the span so one request cannot saturate the pipe
        if end - start > BIG_FILE_SEGMENT_SIZE {
            end = start + BIG_FILE_SEGMENT_SIZE;
        }
        content_length = end - start;

        reader
            .seek_to(start, end)
            .await
            .map_err(|_| ServeError::range_not_satisfiable(&range_header))?;

        req.set_header("Content-Range", &format!("bytes {}-{}/{}", start, end - 1, total_length));
        status = StatusCode::PARTIAL_CONTENT;

        trace!(start, end, "serving byte range");
    } else if total_length >= BIG_FILE_MIN_SIZE {
        // no range on a big file: hand out the first segment only and let
        // the client come back with ranges
        status = StatusCode::PARTIAL_CONTENT;
        content_length = BIG_FILE_SEGMENT_SIZE;
        reader.seek_to(0, content_length).await?;
    }

    req.set_content_type(entry.content_type());
    req.set_header("Content-Length", &content_length.to_string());
    if is_gzip {
        req.set_header("Content-Encoding", "gzip");
    }
    req.set_body_stream(Box::new(reader), content_length);
    req.set_status(status);

    Ok(())
}
